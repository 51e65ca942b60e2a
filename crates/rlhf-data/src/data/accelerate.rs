//! Generated continuations with per-token rewards.

use crate::collate::{self, Batch, Collate, CollateConfig, PaddingSide};
use crate::record::Record;
use crate::shape::{self, Validate};
use crate::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Output tokens and the reward for each of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RLElement {
    /// The output token ids
    pub output_tokens: Array1<i64>,
    /// One reward per output token
    pub rewards: Array1<f32>,
}

impl_record!(RLElement {
    output_tokens,
    rewards,
});

impl RLElement {
    pub fn new(output_tokens: Array1<i64>, rewards: Array1<f32>) -> Result<Self> {
        let element = Self {
            output_tokens,
            rewards,
        };
        element.validate()?;
        Ok(element)
    }

    pub fn len(&self) -> usize {
        self.output_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output_tokens.is_empty()
    }
}

impl Validate for RLElement {
    fn validate(&self) -> Result<()> {
        shape::same_len(
            Self::NAME,
            ("output_tokens", self.output_tokens.len()),
            &[("rewards", self.rewards.len())],
        )
    }
}

/// Batched `RLElement`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RLBatchElement {
    /// Output token ids, `[batch_size, output_size]`
    pub output_tokens: Array2<i64>,
    /// Rewards, `[batch_size, output_size]`
    pub rewards: Array2<f32>,
}

impl_record!(RLBatchElement {
    output_tokens,
    rewards,
});

impl RLBatchElement {
    pub fn new(output_tokens: Array2<i64>, rewards: Array2<f32>) -> Result<Self> {
        let batch = Self {
            output_tokens,
            rewards,
        };
        batch.validate()?;
        Ok(batch)
    }
}

impl Validate for RLBatchElement {
    fn validate(&self) -> Result<()> {
        let tokens = ("output_tokens", self.output_tokens.shape());
        let rewards = ("rewards", self.rewards.shape());
        shape::same_rows(Self::NAME, &[tokens, rewards])?;
        shape::same_cols(Self::NAME, tokens, &[rewards])
    }
}

impl Batch for RLBatchElement {
    type Element = RLElement;

    fn len(&self) -> usize {
        self.output_tokens.nrows()
    }

    fn row(&self, index: usize) -> Option<RLElement> {
        if index >= self.len() {
            return None;
        }
        Some(RLElement {
            output_tokens: self.output_tokens.row(index).to_owned(),
            rewards: self.rewards.row(index).to_owned(),
        })
    }
}

impl Collate for RLElement {
    type Batch = RLBatchElement;

    fn stack(elements: &[Self]) -> Result<RLBatchElement> {
        collate::check_elements(RLBatchElement::NAME, elements)?;
        let record = RLBatchElement::NAME;
        Ok(RLBatchElement {
            output_tokens: collate::stack_rows(
                record,
                "output_tokens",
                &collate::views(elements, |e| e.output_tokens.view()),
            )?,
            rewards: collate::stack_rows(
                record,
                "rewards",
                &collate::views(elements, |e| e.rewards.view()),
            )?,
        })
    }

    fn collate(elements: &[Self], config: &CollateConfig) -> Result<RLBatchElement> {
        collate::check_elements(RLBatchElement::NAME, elements)?;
        tracing::debug!(elements = elements.len(), "Collating RL elements");
        Ok(RLBatchElement {
            output_tokens: collate::pad_rows(
                &collate::views(elements, |e| e.output_tokens.view()),
                config.pad_token_id,
                PaddingSide::Right,
            ),
            rewards: collate::pad_rows(
                &collate::views(elements, |e| e.rewards.view()),
                0.0,
                PaddingSide::Right,
            ),
        })
    }
}
