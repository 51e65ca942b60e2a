//! Positional field values and their conversions.

use crate::types::{String, Vec};
use core::fmt;
use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2};
use serde::{Deserialize, Serialize};

/// A single field value taken out of a record.
///
/// Numeric arrays are carried with a dynamic dimension so that element
/// (1-D) and batch (2-D) fields share one representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A single string
    Text(String),
    /// An ordered sequence of strings
    TextList(Vec<String>),
    /// Integer array (token ids, masks, indices)
    Long(ArrayD<i64>),
    /// Float array (rewards, log-probs, values)
    Float(ArrayD<f32>),
}

impl FieldValue {
    /// Kind and dimensionality of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::TextList(_) => FieldKind::TextList,
            FieldValue::Long(a) => FieldKind::Long(a.ndim()),
            FieldValue::Float(a) => FieldKind::Float(a.ndim()),
        }
    }

    /// Shape of the value. Strings have an empty shape, string lists `[len]`.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            FieldValue::Text(_) => Vec::new(),
            FieldValue::TextList(v) => crate::types::vec![v.len()],
            FieldValue::Long(a) => a.shape().to_vec(),
            FieldValue::Float(a) => a.shape().to_vec(),
        }
    }
}

/// Expected type of a field, used in type-mismatch errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
    /// Integer array with the given number of dimensions
    Long(usize),
    /// Float array with the given number of dimensions
    Float(usize),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::TextList => write!(f, "text list"),
            FieldKind::Long(ndim) => write!(f, "{}-d long array", ndim),
            FieldKind::Float(ndim) => write!(f, "{}-d float array", ndim),
        }
    }
}

/// Conversion between a typed record field and a `FieldValue`.
pub trait Field: Sized {
    /// Kind a value must have to convert back into this type
    const KIND: FieldKind;

    /// Copy the field into a positional value
    fn to_value(&self) -> FieldValue;

    /// Move the field into a positional value
    fn into_value(self) -> FieldValue;

    /// Convert a positional value back, or `None` if the kind does not match
    fn from_value(value: FieldValue) -> Option<Self>;
}

impl Field for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Text(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Field for Vec<String> {
    const KIND: FieldKind = FieldKind::TextList;

    fn to_value(&self) -> FieldValue {
        FieldValue::TextList(self.clone())
    }

    fn into_value(self) -> FieldValue {
        FieldValue::TextList(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::TextList(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_array_field {
    ($array:ty, $variant:ident, $dim:ty, $ndim:expr) => {
        impl Field for $array {
            const KIND: FieldKind = FieldKind::$variant($ndim);

            fn to_value(&self) -> FieldValue {
                FieldValue::$variant(self.clone().into_dyn())
            }

            fn into_value(self) -> FieldValue {
                FieldValue::$variant(self.into_dyn())
            }

            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(a) => a.into_dimensionality::<$dim>().ok(),
                    _ => None,
                }
            }
        }
    };
}

impl_array_field!(Array1<i64>, Long, Ix1, 1);
impl_array_field!(Array2<i64>, Long, Ix2, 2);
impl_array_field!(Array1<f32>, Float, Ix1, 1);
impl_array_field!(Array2<f32>, Float, Ix2, 2);
