//! PPO rollout records.

use crate::collate::{self, Batch, Collate, CollateConfig, PaddingSide};
use crate::record::Record;
use crate::shape::{self, Validate};
use crate::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One PPO training example.
///
/// `logprobs`, `values` and `rewards` hold one entry per response token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PPORLElement {
    /// The query tensor, i.e. the prompt token ids
    pub query_tensor: Array1<i64>,
    /// The response tensor, i.e. the generated token ids
    pub response_tensor: Array1<i64>,
    /// Log-probabilities of the response tokens under the policy
    pub logprobs: Array1<f32>,
    /// Value estimates for each response token
    pub values: Array1<f32>,
    /// Reward for each response token
    pub rewards: Array1<f32>,
}

impl_record!(PPORLElement {
    query_tensor,
    response_tensor,
    logprobs,
    values,
    rewards,
});

impl PPORLElement {
    pub fn new(
        query_tensor: Array1<i64>,
        response_tensor: Array1<i64>,
        logprobs: Array1<f32>,
        values: Array1<f32>,
        rewards: Array1<f32>,
    ) -> Result<Self> {
        let element = Self {
            query_tensor,
            response_tensor,
            logprobs,
            values,
            rewards,
        };
        element.validate()?;
        Ok(element)
    }

    /// Number of response tokens
    pub fn response_len(&self) -> usize {
        self.response_tensor.len()
    }
}

impl Validate for PPORLElement {
    fn validate(&self) -> Result<()> {
        shape::same_len(
            Self::NAME,
            ("response_tensor", self.response_tensor.len()),
            &[
                ("logprobs", self.logprobs.len()),
                ("values", self.values.len()),
                ("rewards", self.rewards.len()),
            ],
        )
    }
}

/// A batched version of `PPORLElement`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PPORLBatch {
    /// `[batch_size, query_size]`
    pub query_tensors: Array2<i64>,
    /// `[batch_size, response_size]`
    pub response_tensors: Array2<i64>,
    /// `[batch_size, response_size]`
    pub logprobs: Array2<f32>,
    /// `[batch_size, response_size]`
    pub values: Array2<f32>,
    /// `[batch_size, response_size]`
    pub rewards: Array2<f32>,
}

impl_record!(PPORLBatch {
    query_tensors,
    response_tensors,
    logprobs,
    values,
    rewards,
});

impl PPORLBatch {
    pub fn new(
        query_tensors: Array2<i64>,
        response_tensors: Array2<i64>,
        logprobs: Array2<f32>,
        values: Array2<f32>,
        rewards: Array2<f32>,
    ) -> Result<Self> {
        let batch = Self {
            query_tensors,
            response_tensors,
            logprobs,
            values,
            rewards,
        };
        batch.validate()?;
        Ok(batch)
    }
}

impl Validate for PPORLBatch {
    fn validate(&self) -> Result<()> {
        let queries = ("query_tensors", self.query_tensors.shape());
        let responses = ("response_tensors", self.response_tensors.shape());
        let logprobs = ("logprobs", self.logprobs.shape());
        let values = ("values", self.values.shape());
        let rewards = ("rewards", self.rewards.shape());

        shape::same_rows(
            Self::NAME,
            &[queries, responses, logprobs, values, rewards],
        )?;
        shape::same_cols(Self::NAME, responses, &[logprobs, values, rewards])
    }
}

impl Batch for PPORLBatch {
    type Element = PPORLElement;

    fn len(&self) -> usize {
        self.query_tensors.nrows()
    }

    fn row(&self, index: usize) -> Option<PPORLElement> {
        if index >= self.len() {
            return None;
        }
        Some(PPORLElement {
            query_tensor: self.query_tensors.row(index).to_owned(),
            response_tensor: self.response_tensors.row(index).to_owned(),
            logprobs: self.logprobs.row(index).to_owned(),
            values: self.values.row(index).to_owned(),
            rewards: self.rewards.row(index).to_owned(),
        })
    }
}

impl Collate for PPORLElement {
    type Batch = PPORLBatch;

    fn stack(elements: &[Self]) -> Result<PPORLBatch> {
        let record = PPORLBatch::NAME;
        collate::check_elements(record, elements)?;
        Ok(PPORLBatch {
            query_tensors: collate::stack_rows(
                record,
                "query_tensors",
                &collate::views(elements, |e| e.query_tensor.view()),
            )?,
            response_tensors: collate::stack_rows(
                record,
                "response_tensors",
                &collate::views(elements, |e| e.response_tensor.view()),
            )?,
            logprobs: collate::stack_rows(
                record,
                "logprobs",
                &collate::views(elements, |e| e.logprobs.view()),
            )?,
            values: collate::stack_rows(
                record,
                "values",
                &collate::views(elements, |e| e.values.view()),
            )?,
            rewards: collate::stack_rows(
                record,
                "rewards",
                &collate::views(elements, |e| e.rewards.view()),
            )?,
        })
    }

    /// Queries are padded on `query_padding_side` so that generation
    /// continues from the last column; responses and their per-token
    /// values are right-padded.
    fn collate(elements: &[Self], config: &CollateConfig) -> Result<PPORLBatch> {
        collate::check_elements(PPORLBatch::NAME, elements)?;
        tracing::debug!(
            elements = elements.len(),
            side = ?config.query_padding_side,
            "Collating PPO elements"
        );
        let right = PaddingSide::Right;
        Ok(PPORLBatch {
            query_tensors: collate::pad_rows(
                &collate::views(elements, |e| e.query_tensor.view()),
                config.pad_token_id,
                config.query_padding_side,
            ),
            response_tensors: collate::pad_rows(
                &collate::views(elements, |e| e.response_tensor.view()),
                config.pad_token_id,
                right,
            ),
            logprobs: collate::pad_rows(
                &collate::views(elements, |e| e.logprobs.view()),
                0.0,
                right,
            ),
            values: collate::pad_rows(
                &collate::views(elements, |e| e.values.view()),
                0.0,
                right,
            ),
            rewards: collate::pad_rows(
                &collate::views(elements, |e| e.rewards.view()),
                0.0,
                right,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{flatten, unflatten, FieldValue};
    use crate::DataError;
    use ndarray::array;

    fn element(query: &[i64], response: &[i64]) -> PPORLElement {
        let n = response.len();
        PPORLElement::new(
            Array1::from(query.to_vec()),
            Array1::from(response.to_vec()),
            Array1::from_elem(n, -0.5),
            Array1::from_elem(n, 0.25),
            Array1::from_elem(n, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_per_token_lengths_must_match() {
        let err = PPORLElement::new(
            array![1, 2, 3],
            array![4, 5],
            array![0.1, 0.2],
            array![0.5, 0.6],
            array![1.0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataError::ShapeMismatch { field: "rewards", .. }
        ));
    }

    #[test]
    fn test_flatten_scenario() {
        let element = PPORLElement::new(
            array![1, 2, 3],
            array![4, 5],
            array![0.1, 0.2],
            array![0.5, 0.6],
            array![1.0, 0.0],
        )
        .unwrap();
        let fields = flatten(&element).unwrap();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], FieldValue::Long(array![1i64, 2, 3].into_dyn()));
        assert_eq!(fields[4], FieldValue::Float(array![1.0f32, 0.0].into_dyn()));
        assert_eq!(unflatten::<PPORLElement>(fields).unwrap(), element);
    }

    #[test]
    fn test_stack_adds_leading_dimension() {
        let elements = vec![element(&[1, 2], &[3, 4, 5]), element(&[6, 7], &[8, 9, 10])];
        let batch = PPORLElement::stack(&elements).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.query_tensors.shape(), &[2, 2]);
        for shape in [
            batch.response_tensors.shape(),
            batch.logprobs.shape(),
            batch.values.shape(),
            batch.rewards.shape(),
        ] {
            assert_eq!(shape, &[2, 3]);
        }
        assert_eq!(batch.row(1).unwrap(), elements[1]);
    }

    #[test]
    fn test_collate_left_pads_queries_right_pads_responses() {
        let elements = [element(&[1], &[2, 3]), element(&[4, 5, 6], &[7])];
        let config = CollateConfig {
            pad_token_id: 0,
            query_padding_side: PaddingSide::Left,
        };
        let batch = PPORLElement::collate(&elements, &config).unwrap();

        assert_eq!(batch.query_tensors, array![[0, 0, 1], [4, 5, 6]]);
        assert_eq!(batch.response_tensors, array![[2, 3], [7, 0]]);
        assert_eq!(batch.logprobs, array![[-0.5, -0.5], [-0.5, 0.0]]);
        assert_eq!(batch.values, array![[0.25, 0.25], [0.25, 0.0]]);
        assert_eq!(batch.rewards, array![[1.0, 1.0], [1.0, 0.0]]);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_stack_and_collate_reject_malformed_element() {
        let bad = PPORLElement {
            query_tensor: array![1, 2, 3],
            response_tensor: array![4, 5],
            logprobs: array![0.1, 0.2, 0.3],
            values: array![0.5],
            rewards: array![1.0, 0.0],
        };
        let elements = [element(&[1], &[2, 3]), bad];

        for result in [
            PPORLElement::stack(&elements[1..]),
            PPORLElement::collate(&elements, &CollateConfig::default()),
        ] {
            assert!(matches!(
                result,
                Err(DataError::ShapeMismatch {
                    record: "PPORLElement",
                    field: "logprobs",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_batch_response_columns_must_match() {
        let err = PPORLBatch::new(
            array![[1, 2]],
            array![[3, 4]],
            array![[0.1, 0.2]],
            array![[0.1]],
            array![[0.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DataError::ShapeMismatch { field: "values", .. }
        ));
    }
}
