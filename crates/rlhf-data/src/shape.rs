//! Shape invariants for element and batch records.

use crate::types::vec;
use crate::{DataError, Result};

/// Records that can check their own shape invariants.
pub trait Validate {
    /// Return an error describing the first violated invariant
    fn validate(&self) -> Result<()>;
}

/// Check that every `(field, len)` pair has the same length as the anchor.
///
/// Used for per-token sequences tied to the same role, e.g. a response
/// and its log-probs.
pub(crate) fn same_len(
    record: &'static str,
    anchor: (&'static str, usize),
    others: &[(&'static str, usize)],
) -> Result<()> {
    let (_, expected) = anchor;
    for &(field, actual) in others {
        if actual != expected {
            return Err(DataError::ShapeMismatch {
                record,
                field,
                expected: vec![expected],
                actual: vec![actual],
            });
        }
    }
    Ok(())
}

/// Check that every batch field shares the leading (batch) dimension.
pub(crate) fn same_rows(record: &'static str, fields: &[(&'static str, &[usize])]) -> Result<()> {
    let Some(&(_, first)) = fields.first() else {
        return Ok(());
    };
    let rows = first.first().copied().unwrap_or(0);
    for &(field, shape) in &fields[1..] {
        if shape.first().copied().unwrap_or(0) != rows {
            let mut expected = shape.to_vec();
            if let Some(lead) = expected.first_mut() {
                *lead = rows;
            }
            return Err(DataError::ShapeMismatch {
                record,
                field,
                expected,
                actual: shape.to_vec(),
            });
        }
    }
    Ok(())
}

/// Check that 2-D batch fields tied to the same role share their column count.
pub(crate) fn same_cols(
    record: &'static str,
    anchor: (&'static str, &[usize]),
    others: &[(&'static str, &[usize])],
) -> Result<()> {
    let (_, anchor_shape) = anchor;
    let cols = anchor_shape.get(1).copied().unwrap_or(0);
    for &(field, shape) in others {
        if shape.get(1).copied().unwrap_or(0) != cols {
            return Err(DataError::ShapeMismatch {
                record,
                field,
                expected: vec![shape.first().copied().unwrap_or(0), cols],
                actual: shape.to_vec(),
            });
        }
    }
    Ok(())
}
