//! Record descriptors and positional flattening.
//!
//! Every record type declares an ordered list of field names once. Both
//! directions of the conversion are driven by that list, so a flattened
//! record always lines up with the unflattener for the same type.

mod value;

pub use value::{Field, FieldKind, FieldValue};

use crate::shape::Validate;
use crate::types::Vec;
use crate::{DataError, Result};

/// Descriptor for a named-field record.
pub trait Record: Validate + Sized {
    /// Record type name used in error messages
    const NAME: &'static str;

    /// Field names in declaration order. Never empty.
    fn field_names() -> &'static [&'static str];

    /// Copy out the value of a named field, or `None` if the record has no such field
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Build a record from named values without validating shapes
    fn from_fields(fields: NamedFields) -> Result<Self>;

    /// Move all fields out in declaration order
    fn into_fields(self) -> Vec<FieldValue>;

    /// Number of declared fields
    fn arity() -> usize {
        Self::field_names().len()
    }
}

/// Field values keyed by name, consumed while a record is rebuilt.
#[derive(Clone, Debug)]
pub struct NamedFields {
    record: &'static str,
    values: Vec<(&'static str, FieldValue)>,
}

impl NamedFields {
    /// Create an empty set of fields for the named record type
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            values: Vec::new(),
        }
    }

    /// Pair each declared name with its positional value
    pub fn from_positional<I>(record: &'static str, names: &[&'static str], values: I) -> Self
    where
        I: IntoIterator<Item = FieldValue>,
    {
        Self {
            record,
            values: names.iter().copied().zip(values).collect(),
        }
    }

    /// Set a field, replacing any previous value under the same name
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove a field and convert it to its typed form
    pub fn take<F: Field>(&mut self, name: &'static str) -> Result<F> {
        let pos = self
            .values
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or(DataError::MissingField {
                record: self.record,
                field: name,
            })?;
        let (_, value) = self.values.remove(pos);
        let actual = value.kind();
        F::from_value(value).ok_or(DataError::FieldType {
            record: self.record,
            field: name,
            expected: F::KIND,
            actual,
        })
    }
}

/// Return a function that flattens a record into its field values in declaration order.
pub fn make_flattener<T: Record>() -> impl Fn(&T) -> Result<Vec<FieldValue>> {
    let names = T::field_names();
    move |record: &T| {
        names
            .iter()
            .map(|&name| {
                record.field(name).ok_or(DataError::MissingField {
                    record: T::NAME,
                    field: name,
                })
            })
            .collect()
    }
}

/// Return a function that rebuilds a record from positional field values.
///
/// The rebuilt record is validated before it is returned.
pub fn make_unflattener<T: Record>() -> impl Fn(Vec<FieldValue>) -> Result<T> {
    let names = T::field_names();
    move |values: Vec<FieldValue>| {
        if values.len() != names.len() {
            return Err(DataError::ArityMismatch {
                record: T::NAME,
                expected: names.len(),
                actual: values.len(),
            });
        }
        let record = T::from_fields(NamedFields::from_positional(T::NAME, names, values))?;
        record.validate()?;
        Ok(record)
    }
}

/// Flatten a single record.
pub fn flatten<T: Record>(record: &T) -> Result<Vec<FieldValue>> {
    make_flattener::<T>()(record)
}

/// Unflatten a single record.
pub fn unflatten<T: Record>(values: Vec<FieldValue>) -> Result<T> {
    make_unflattener::<T>()(values)
}

/// Flatten by value, without copying field data.
pub fn into_fields<T: Record>(record: T) -> Vec<FieldValue> {
    record.into_fields()
}
