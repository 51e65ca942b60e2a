//! Offline RL (ILQL) training examples.
//!
//! `states_ixs` and `actions_ixs` index positions inside the token sequence
//! (the decoder sequence for seq2seq models). Rewards line up with actions
//! and `dones` line up with states, so neither has to match the input
//! length.

use crate::collate::{self, Batch, Collate, CollateConfig, PaddingSide};
use crate::record::Record;
use crate::shape::{self, Validate};
use crate::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Data element for ILQL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ILQLElement {
    /// Input token ids
    pub input_ids: Array1<i64>,
    /// Attention mask, same length as `input_ids`
    pub attention_mask: Array1<i64>,
    /// One reward per action
    pub rewards: Array1<f32>,
    /// Token positions of states
    pub states_ixs: Array1<i64>,
    /// Token positions of actions
    pub actions_ixs: Array1<i64>,
    /// Terminal flag per state
    pub dones: Array1<i64>,
}

impl_record!(ILQLElement {
    input_ids,
    attention_mask,
    rewards,
    states_ixs,
    actions_ixs,
    dones,
});

impl ILQLElement {
    pub fn new(
        input_ids: Array1<i64>,
        attention_mask: Array1<i64>,
        rewards: Array1<f32>,
        states_ixs: Array1<i64>,
        actions_ixs: Array1<i64>,
        dones: Array1<i64>,
    ) -> Result<Self> {
        let element = Self {
            input_ids,
            attention_mask,
            rewards,
            states_ixs,
            actions_ixs,
            dones,
        };
        element.validate()?;
        Ok(element)
    }
}

impl Validate for ILQLElement {
    fn validate(&self) -> Result<()> {
        validate_ilql_lens(
            Self::NAME,
            self.input_ids.len(),
            self.attention_mask.len(),
            self.rewards.len(),
            self.states_ixs.len(),
            self.actions_ixs.len(),
            self.dones.len(),
        )
    }
}

/// ILQL element for encoder-decoder models.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ILQLSeq2SeqElement {
    /// Encoder input token ids
    pub input_ids: Array1<i64>,
    /// Encoder attention mask
    pub attention_mask: Array1<i64>,
    /// Decoder input token ids
    pub decoder_input_ids: Array1<i64>,
    /// One reward per action
    pub rewards: Array1<f32>,
    /// Decoder positions of states
    pub states_ixs: Array1<i64>,
    /// Decoder positions of actions
    pub actions_ixs: Array1<i64>,
    /// Terminal flag per state
    pub dones: Array1<i64>,
}

impl_record!(ILQLSeq2SeqElement {
    input_ids,
    attention_mask,
    decoder_input_ids,
    rewards,
    states_ixs,
    actions_ixs,
    dones,
});

impl ILQLSeq2SeqElement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_ids: Array1<i64>,
        attention_mask: Array1<i64>,
        decoder_input_ids: Array1<i64>,
        rewards: Array1<f32>,
        states_ixs: Array1<i64>,
        actions_ixs: Array1<i64>,
        dones: Array1<i64>,
    ) -> Result<Self> {
        let element = Self {
            input_ids,
            attention_mask,
            decoder_input_ids,
            rewards,
            states_ixs,
            actions_ixs,
            dones,
        };
        element.validate()?;
        Ok(element)
    }
}

impl Validate for ILQLSeq2SeqElement {
    fn validate(&self) -> Result<()> {
        validate_ilql_lens(
            Self::NAME,
            self.input_ids.len(),
            self.attention_mask.len(),
            self.rewards.len(),
            self.states_ixs.len(),
            self.actions_ixs.len(),
            self.dones.len(),
        )
    }
}

fn validate_ilql_lens(
    record: &'static str,
    input_ids: usize,
    attention_mask: usize,
    rewards: usize,
    states_ixs: usize,
    actions_ixs: usize,
    dones: usize,
) -> Result<()> {
    shape::same_len(
        record,
        ("input_ids", input_ids),
        &[("attention_mask", attention_mask)],
    )?;
    shape::same_len(record, ("actions_ixs", actions_ixs), &[("rewards", rewards)])?;
    shape::same_len(record, ("states_ixs", states_ixs), &[("dones", dones)])
}

/// Batched ILQL data elements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ILQLBatch {
    /// `[batch_size, query_size]`
    pub input_ids: Array2<i64>,
    /// `[batch_size, query_size]`
    pub attention_mask: Array2<i64>,
    /// `[batch_size, reward_size]`
    pub rewards: Array2<f32>,
    /// `[batch_size, states_size]`
    pub states_ixs: Array2<i64>,
    /// `[batch_size, reward_size]`
    pub actions_ixs: Array2<i64>,
    /// `[batch_size, states_size]`
    pub dones: Array2<i64>,
}

impl_record!(ILQLBatch {
    input_ids,
    attention_mask,
    rewards,
    states_ixs,
    actions_ixs,
    dones,
});

impl ILQLBatch {
    pub fn new(
        input_ids: Array2<i64>,
        attention_mask: Array2<i64>,
        rewards: Array2<f32>,
        states_ixs: Array2<i64>,
        actions_ixs: Array2<i64>,
        dones: Array2<i64>,
    ) -> Result<Self> {
        let batch = Self {
            input_ids,
            attention_mask,
            rewards,
            states_ixs,
            actions_ixs,
            dones,
        };
        batch.validate()?;
        Ok(batch)
    }
}

impl Validate for ILQLBatch {
    fn validate(&self) -> Result<()> {
        let input_ids = ("input_ids", self.input_ids.shape());
        let attention_mask = ("attention_mask", self.attention_mask.shape());
        let rewards = ("rewards", self.rewards.shape());
        let states_ixs = ("states_ixs", self.states_ixs.shape());
        let actions_ixs = ("actions_ixs", self.actions_ixs.shape());
        let dones = ("dones", self.dones.shape());

        shape::same_rows(
            Self::NAME,
            &[input_ids, attention_mask, rewards, states_ixs, actions_ixs, dones],
        )?;
        shape::same_cols(Self::NAME, input_ids, &[attention_mask])?;
        shape::same_cols(Self::NAME, actions_ixs, &[rewards])?;
        shape::same_cols(Self::NAME, states_ixs, &[dones])
    }
}

impl Batch for ILQLBatch {
    type Element = ILQLElement;

    fn len(&self) -> usize {
        self.input_ids.nrows()
    }

    fn row(&self, index: usize) -> Option<ILQLElement> {
        if index >= self.len() {
            return None;
        }
        Some(ILQLElement {
            input_ids: self.input_ids.row(index).to_owned(),
            attention_mask: self.attention_mask.row(index).to_owned(),
            rewards: self.rewards.row(index).to_owned(),
            states_ixs: self.states_ixs.row(index).to_owned(),
            actions_ixs: self.actions_ixs.row(index).to_owned(),
            dones: self.dones.row(index).to_owned(),
        })
    }
}

impl Collate for ILQLElement {
    type Batch = ILQLBatch;

    fn stack(elements: &[Self]) -> Result<ILQLBatch> {
        let record = ILQLBatch::NAME;
        collate::check_elements(record, elements)?;
        Ok(ILQLBatch {
            input_ids: collate::stack_rows(
                record,
                "input_ids",
                &collate::views(elements, |e| e.input_ids.view()),
            )?,
            attention_mask: collate::stack_rows(
                record,
                "attention_mask",
                &collate::views(elements, |e| e.attention_mask.view()),
            )?,
            rewards: collate::stack_rows(
                record,
                "rewards",
                &collate::views(elements, |e| e.rewards.view()),
            )?,
            states_ixs: collate::stack_rows(
                record,
                "states_ixs",
                &collate::views(elements, |e| e.states_ixs.view()),
            )?,
            actions_ixs: collate::stack_rows(
                record,
                "actions_ixs",
                &collate::views(elements, |e| e.actions_ixs.view()),
            )?,
            dones: collate::stack_rows(
                record,
                "dones",
                &collate::views(elements, |e| e.dones.view()),
            )?,
        })
    }

    fn collate(elements: &[Self], config: &CollateConfig) -> Result<ILQLBatch> {
        collate::check_elements(ILQLBatch::NAME, elements)?;
        tracing::debug!(elements = elements.len(), "Collating ILQL elements");
        let right = PaddingSide::Right;
        Ok(ILQLBatch {
            input_ids: collate::pad_rows(
                &collate::views(elements, |e| e.input_ids.view()),
                config.pad_token_id,
                right,
            ),
            attention_mask: collate::pad_rows(
                &collate::views(elements, |e| e.attention_mask.view()),
                0,
                right,
            ),
            rewards: collate::pad_rows(
                &collate::views(elements, |e| e.rewards.view()),
                0.0,
                right,
            ),
            states_ixs: collate::pad_rows(
                &collate::views(elements, |e| e.states_ixs.view()),
                0,
                right,
            ),
            actions_ixs: collate::pad_rows(
                &collate::views(elements, |e| e.actions_ixs.view()),
                0,
                right,
            ),
            dones: collate::pad_rows(&collate::views(elements, |e| e.dones.view()), 0, right),
        })
    }
}

/// Batched ILQL seq2seq data elements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ILQLSeq2SeqBatch {
    /// `[batch_size, query_size]`
    pub input_ids: Array2<i64>,
    /// `[batch_size, query_size]`
    pub attention_mask: Array2<i64>,
    /// `[batch_size, decoder_size]`
    pub decoder_input_ids: Array2<i64>,
    /// `[batch_size, reward_size]`
    pub rewards: Array2<f32>,
    /// `[batch_size, states_size]`
    pub states_ixs: Array2<i64>,
    /// `[batch_size, reward_size]`
    pub actions_ixs: Array2<i64>,
    /// `[batch_size, states_size]`
    pub dones: Array2<i64>,
}

impl_record!(ILQLSeq2SeqBatch {
    input_ids,
    attention_mask,
    decoder_input_ids,
    rewards,
    states_ixs,
    actions_ixs,
    dones,
});

impl ILQLSeq2SeqBatch {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_ids: Array2<i64>,
        attention_mask: Array2<i64>,
        decoder_input_ids: Array2<i64>,
        rewards: Array2<f32>,
        states_ixs: Array2<i64>,
        actions_ixs: Array2<i64>,
        dones: Array2<i64>,
    ) -> Result<Self> {
        let batch = Self {
            input_ids,
            attention_mask,
            decoder_input_ids,
            rewards,
            states_ixs,
            actions_ixs,
            dones,
        };
        batch.validate()?;
        Ok(batch)
    }
}

impl Validate for ILQLSeq2SeqBatch {
    fn validate(&self) -> Result<()> {
        let input_ids = ("input_ids", self.input_ids.shape());
        let attention_mask = ("attention_mask", self.attention_mask.shape());
        let decoder_input_ids = ("decoder_input_ids", self.decoder_input_ids.shape());
        let rewards = ("rewards", self.rewards.shape());
        let states_ixs = ("states_ixs", self.states_ixs.shape());
        let actions_ixs = ("actions_ixs", self.actions_ixs.shape());
        let dones = ("dones", self.dones.shape());

        shape::same_rows(
            Self::NAME,
            &[
                input_ids,
                attention_mask,
                decoder_input_ids,
                rewards,
                states_ixs,
                actions_ixs,
                dones,
            ],
        )?;
        shape::same_cols(Self::NAME, input_ids, &[attention_mask])?;
        shape::same_cols(Self::NAME, actions_ixs, &[rewards])?;
        shape::same_cols(Self::NAME, states_ixs, &[dones])
    }
}

impl Batch for ILQLSeq2SeqBatch {
    type Element = ILQLSeq2SeqElement;

    fn len(&self) -> usize {
        self.input_ids.nrows()
    }

    fn row(&self, index: usize) -> Option<ILQLSeq2SeqElement> {
        if index >= self.len() {
            return None;
        }
        Some(ILQLSeq2SeqElement {
            input_ids: self.input_ids.row(index).to_owned(),
            attention_mask: self.attention_mask.row(index).to_owned(),
            decoder_input_ids: self.decoder_input_ids.row(index).to_owned(),
            rewards: self.rewards.row(index).to_owned(),
            states_ixs: self.states_ixs.row(index).to_owned(),
            actions_ixs: self.actions_ixs.row(index).to_owned(),
            dones: self.dones.row(index).to_owned(),
        })
    }
}

impl Collate for ILQLSeq2SeqElement {
    type Batch = ILQLSeq2SeqBatch;

    fn stack(elements: &[Self]) -> Result<ILQLSeq2SeqBatch> {
        let record = ILQLSeq2SeqBatch::NAME;
        collate::check_elements(record, elements)?;
        Ok(ILQLSeq2SeqBatch {
            input_ids: collate::stack_rows(
                record,
                "input_ids",
                &collate::views(elements, |e| e.input_ids.view()),
            )?,
            attention_mask: collate::stack_rows(
                record,
                "attention_mask",
                &collate::views(elements, |e| e.attention_mask.view()),
            )?,
            decoder_input_ids: collate::stack_rows(
                record,
                "decoder_input_ids",
                &collate::views(elements, |e| e.decoder_input_ids.view()),
            )?,
            rewards: collate::stack_rows(
                record,
                "rewards",
                &collate::views(elements, |e| e.rewards.view()),
            )?,
            states_ixs: collate::stack_rows(
                record,
                "states_ixs",
                &collate::views(elements, |e| e.states_ixs.view()),
            )?,
            actions_ixs: collate::stack_rows(
                record,
                "actions_ixs",
                &collate::views(elements, |e| e.actions_ixs.view()),
            )?,
            dones: collate::stack_rows(
                record,
                "dones",
                &collate::views(elements, |e| e.dones.view()),
            )?,
        })
    }

    fn collate(elements: &[Self], config: &CollateConfig) -> Result<ILQLSeq2SeqBatch> {
        collate::check_elements(ILQLSeq2SeqBatch::NAME, elements)?;
        tracing::debug!(elements = elements.len(), "Collating ILQL seq2seq elements");
        let right = PaddingSide::Right;
        Ok(ILQLSeq2SeqBatch {
            input_ids: collate::pad_rows(
                &collate::views(elements, |e| e.input_ids.view()),
                config.pad_token_id,
                right,
            ),
            attention_mask: collate::pad_rows(
                &collate::views(elements, |e| e.attention_mask.view()),
                0,
                right,
            ),
            decoder_input_ids: collate::pad_rows(
                &collate::views(elements, |e| e.decoder_input_ids.view()),
                config.pad_token_id,
                right,
            ),
            rewards: collate::pad_rows(
                &collate::views(elements, |e| e.rewards.view()),
                0.0,
                right,
            ),
            states_ixs: collate::pad_rows(
                &collate::views(elements, |e| e.states_ixs.view()),
                0,
                right,
            ),
            actions_ixs: collate::pad_rows(
                &collate::views(elements, |e| e.actions_ixs.view()),
                0,
                right,
            ),
            dones: collate::pad_rows(&collate::views(elements, |e| e.dones.view()), 0, right),
        })
    }
}
