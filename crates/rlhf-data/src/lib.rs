//! # rlhf-data
//!
//! Element and batch records passed between the stages of an RLHF training
//! pipeline: prompt construction, rollout collection and batched optimizer
//! updates.
//!
//! ## Overview
//!
//! rlhf-data provides:
//! - Prompt, accelerate-RL, ILQL and PPO records in element and batch form
//! - The `Record` descriptor with positional flatten/unflatten
//! - Shape validation for per-token and batch-dimension invariants
//! - Strict stacking and padded collation of elements into batches
//! - `RolloutStore` for assembling minibatches - requires `std` feature
//!
//! ## Features
//!
//! - `default` - Enables `std`
//! - `std` - Standard library support and the rollout store
//!
//! ## Quick Start
//!
//! ```rust
//! use rlhf_data::prelude::*;
//! use ndarray::array;
//!
//! let element = PPORLElement::new(
//!     array![1, 2, 3],
//!     array![4, 5],
//!     array![0.1, 0.2],
//!     array![0.5, 0.6],
//!     array![1.0, 0.0],
//! )
//! .unwrap();
//!
//! let flatten = make_flattener::<PPORLElement>();
//! let unflatten = make_unflattener::<PPORLElement>();
//! let fields = flatten(&element).unwrap();
//! assert_eq!(fields.len(), 5);
//! assert_eq!(unflatten(fields).unwrap(), element);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

/// Common types abstraction for no_std support
pub mod types {
    #[cfg(feature = "std")]
    pub use std::string::String;
    #[cfg(feature = "std")]
    pub use std::vec;
    #[cfg(feature = "std")]
    pub use std::vec::Vec;

    #[cfg(not(feature = "std"))]
    pub use alloc::string::String;
    #[cfg(not(feature = "std"))]
    pub use alloc::vec;
    #[cfg(not(feature = "std"))]
    pub use alloc::vec::Vec;
}

#[macro_use]
mod macros;

pub mod collate;
pub mod data;
pub mod record;
pub mod shape;

// Minibatch assembly over collected rollouts
#[cfg(feature = "std")]
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collate::{Batch, Collate, CollateConfig, PaddingSide};
    pub use crate::data::{
        ILQLBatch, ILQLElement, ILQLSeq2SeqBatch, ILQLSeq2SeqElement, PPORLBatch, PPORLElement,
        PromptBatch, PromptElement, RLBatchElement, RLElement,
    };
    pub use crate::record::{
        flatten, into_fields, make_flattener, make_unflattener, unflatten, Field, FieldKind,
        FieldValue, NamedFields, Record,
    };
    pub use crate::shape::Validate;

    #[cfg(feature = "std")]
    pub use crate::store::{LoaderConfig, RolloutStore};

    pub use crate::{DataError, Result};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::record::FieldKind;
use crate::types::{String, Vec};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("{record} has no field `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record} expects {expected} positional values, got {actual}")]
    ArityMismatch {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{record}.{field}: expected {expected}, got {actual}")]
    FieldType {
        record: &'static str,
        field: &'static str,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("{record}.{field}: shape mismatch, expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        record: &'static str,
        field: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Cannot build {0} from zero elements")]
    EmptyBatch(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Array error: {0}")]
    Ndarray(ndarray::ShapeError),
}

// ShapeError only implements `Error` with ndarray's `std` feature.
impl From<ndarray::ShapeError> for DataError {
    fn from(err: ndarray::ShapeError) -> Self {
        DataError::Ndarray(err)
    }
}

pub type Result<T> = core::result::Result<T, DataError>;
