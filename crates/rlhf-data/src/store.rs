//! Rollout storage and minibatch assembly.

use crate::collate::{Collate, CollateConfig};
use crate::{DataError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for splitting a store into minibatches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Elements per minibatch
    pub batch_size: usize,
    /// Shuffle element order before chunking
    pub shuffle: bool,
    /// Drop a trailing minibatch smaller than `batch_size`
    pub drop_last: bool,
    /// Seed for shuffling. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Padding used when collating each minibatch
    pub collate: CollateConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            shuffle: false,
            drop_last: false,
            seed: None,
            collate: CollateConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DataError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Append-only store of rollout elements.
#[derive(Clone, Debug)]
pub struct RolloutStore<E> {
    elements: Vec<E>,
}

impl<E> Default for RolloutStore<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<E: Collate> RolloutStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    /// Add an element after checking its shape invariants
    pub fn push(&mut self, element: E) -> Result<()> {
        element.validate()?;
        self.elements.push(element);
        Ok(())
    }

    /// Add several elements. Stops at the first invalid one.
    pub fn extend<I: IntoIterator<Item = E>>(&mut self, elements: I) -> Result<()> {
        for element in elements {
            self.push(element)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// Split the store into collated minibatches.
    pub fn minibatches(&self, config: &LoaderConfig) -> Result<Vec<E::Batch>> {
        config.validate()?;

        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        if config.shuffle {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }

        let mut batches = Vec::with_capacity(order.len().div_ceil(config.batch_size));
        for chunk in order.chunks(config.batch_size) {
            if config.drop_last && chunk.len() < config.batch_size {
                tracing::warn!(
                    record = E::NAME,
                    dropped = chunk.len(),
                    batch_size = config.batch_size,
                    "Dropping incomplete minibatch"
                );
                continue;
            }
            let elements: Vec<E> = chunk.iter().map(|&i| self.elements[i].clone()).collect();
            batches.push(E::collate(&elements, &config.collate)?);
        }

        tracing::debug!(
            record = E::NAME,
            elements = self.elements.len(),
            batches = batches.len(),
            "Assembled minibatches"
        );
        Ok(batches)
    }
}
