//! Assembling elements into batches.
//!
//! `Collate::stack` requires every element to share each field's length and
//! produces exactly `[n, len]` per field. `Collate::collate` pads ragged
//! fields to the longest row instead.

use crate::record::Record;
use crate::shape::Validate;
use crate::types::{vec, Vec};
use crate::{DataError, Result};
use ndarray::{s, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Side on which short sequences receive padding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingSide {
    /// Pad before the sequence so that it ends at the last column
    #[default]
    Left,
    /// Pad after the sequence
    Right,
}

/// Configuration for padded collation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollateConfig {
    /// Token id used to pad token fields
    pub pad_token_id: i64,
    /// Padding side for prompts and PPO queries. Responses and all
    /// per-token values are always right-padded.
    pub query_padding_side: PaddingSide,
}

impl Default for CollateConfig {
    fn default() -> Self {
        Self {
            pad_token_id: 0,
            query_padding_side: PaddingSide::Left,
        }
    }
}

/// A batched record holding one row per element.
pub trait Batch: Record {
    /// Element type stored in each row
    type Element: Record;

    /// Size of the leading (batch) dimension
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out row `index` as an element, padding included
    fn row(&self, index: usize) -> Option<Self::Element>;

    /// Copy out every row
    fn unstack(&self) -> Vec<Self::Element> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }
}

/// Element records that can be assembled into a batch.
pub trait Collate: Record + Clone {
    /// Batched form of this element
    type Batch: Batch<Element = Self>;

    /// Stack elements whose fields already share their lengths
    fn stack(elements: &[Self]) -> Result<Self::Batch>;

    /// Stack elements, padding ragged fields to the longest row
    fn collate(elements: &[Self], config: &CollateConfig) -> Result<Self::Batch>;
}

/// Reject empty element lists and malformed elements before any field is
/// assembled.
pub(crate) fn check_elements<E: Validate>(record: &'static str, elements: &[E]) -> Result<()> {
    if elements.is_empty() {
        return Err(DataError::EmptyBatch(record));
    }
    elements.iter().try_for_each(Validate::validate)
}

/// Borrow one field of every element as a row view.
pub(crate) fn views<'a, E, T, F>(elements: &'a [E], f: F) -> Vec<ArrayView1<'a, T>>
where
    F: Fn(&'a E) -> ArrayView1<'a, T>,
{
    elements.iter().map(f).collect()
}

/// Stack equal-length rows along a new leading axis.
pub(crate) fn stack_rows<T: Clone>(
    record: &'static str,
    field: &'static str,
    rows: &[ArrayView1<'_, T>],
) -> Result<Array2<T>> {
    let width = rows.first().ok_or(DataError::EmptyBatch(record))?.len();
    if let Some(row) = rows.iter().find(|r| r.len() != width) {
        return Err(DataError::ShapeMismatch {
            record,
            field,
            expected: vec![width],
            actual: vec![row.len()],
        });
    }
    Ok(ndarray::stack(Axis(0), rows)?)
}

/// Pad rows to the longest one and stack them.
pub(crate) fn pad_rows<T: Clone>(
    rows: &[ArrayView1<'_, T>],
    pad: T,
    side: PaddingSide,
) -> Array2<T> {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut out = Array2::from_elem((rows.len(), width), pad);
    for (i, row) in rows.iter().enumerate() {
        let start = match side {
            PaddingSide::Left => width - row.len(),
            PaddingSide::Right => 0,
        };
        out.slice_mut(s![i, start..start + row.len()]).assign(row);
    }
    out
}
