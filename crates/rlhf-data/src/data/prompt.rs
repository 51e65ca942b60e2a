//! Tokenized prompts.

use crate::collate::{self, Batch, Collate, CollateConfig};
use crate::record::Record;
use crate::shape::{self, Validate};
use crate::types::{String, Vec};
use crate::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A single prompt, containing its string and tokenized form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptElement {
    /// The prompt text
    pub text: String,
    /// The prompt token ids
    pub tokens: Array1<i64>,
}

impl_record!(PromptElement { text, tokens });

impl PromptElement {
    pub fn new(text: impl Into<String>, tokens: Array1<i64>) -> Self {
        Self {
            text: text.into(),
            tokens,
        }
    }
}

impl Validate for PromptElement {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Batched `PromptElement`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptBatch {
    /// One text per row
    pub text: Vec<String>,
    /// Token ids, `[batch_size, num_tokens]`
    pub tokens: Array2<i64>,
}

impl_record!(PromptBatch { text, tokens });

impl PromptBatch {
    pub fn new(text: Vec<String>, tokens: Array2<i64>) -> Result<Self> {
        let batch = Self { text, tokens };
        batch.validate()?;
        Ok(batch)
    }
}

impl Validate for PromptBatch {
    fn validate(&self) -> Result<()> {
        let text_shape: &[usize] = &[self.text.len()];
        shape::same_rows(
            Self::NAME,
            &[("text", text_shape), ("tokens", self.tokens.shape())],
        )
    }
}

impl Batch for PromptBatch {
    type Element = PromptElement;

    /// Rows that have both a text and a token row
    fn len(&self) -> usize {
        self.text.len().min(self.tokens.nrows())
    }

    fn row(&self, index: usize) -> Option<PromptElement> {
        if index >= self.len() {
            return None;
        }
        Some(PromptElement {
            text: self.text[index].clone(),
            tokens: self.tokens.row(index).to_owned(),
        })
    }
}

impl Collate for PromptElement {
    type Batch = PromptBatch;

    fn stack(elements: &[Self]) -> Result<PromptBatch> {
        collate::check_elements(PromptBatch::NAME, elements)?;
        let tokens = collate::views(elements, |e| e.tokens.view());
        Ok(PromptBatch {
            text: elements.iter().map(|e| e.text.clone()).collect(),
            tokens: collate::stack_rows(PromptBatch::NAME, "tokens", &tokens)?,
        })
    }

    fn collate(elements: &[Self], config: &CollateConfig) -> Result<PromptBatch> {
        collate::check_elements(PromptBatch::NAME, elements)?;
        tracing::debug!(
            elements = elements.len(),
            side = ?config.query_padding_side,
            "Collating prompts"
        );
        let tokens = collate::views(elements, |e| e.tokens.view());
        Ok(PromptBatch {
            text: elements.iter().map(|e| e.text.clone()).collect(),
            tokens: collate::pad_rows(&tokens, config.pad_token_id, config.query_padding_side),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collate::PaddingSide;
    use crate::record::{flatten, unflatten, FieldValue};
    use crate::DataError;
    use ndarray::array;

    #[test]
    fn test_prompt_round_trip() {
        let prompt = PromptElement::new("hello", array![15496, 11]);
        let fields = flatten(&prompt).unwrap();
        assert_eq!(fields[0], FieldValue::Text("hello".into()));
        assert_eq!(unflatten::<PromptElement>(fields).unwrap(), prompt);
    }

    #[test]
    fn test_prompt_batch_rows_must_match_texts() {
        let err = PromptBatch::new(vec!["a".into()], array![[1, 2], [3, 4]]).unwrap_err();
        assert!(matches!(
            err,
            DataError::ShapeMismatch { field: "tokens", .. }
        ));
    }

    #[test]
    fn test_collate_left_pads_prompts() {
        let prompts = [
            PromptElement::new("a b c", array![1, 2, 3]),
            PromptElement::new("d", array![4]),
        ];
        let config = CollateConfig {
            pad_token_id: 9,
            query_padding_side: PaddingSide::Left,
        };
        let batch = PromptElement::collate(&prompts, &config).unwrap();
        assert_eq!(batch.tokens, array![[1, 2, 3], [9, 9, 4]]);
        assert_eq!(batch.text, vec!["a b c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_stack_and_unstack() {
        let prompts = vec![
            PromptElement::new("a", array![1, 2]),
            PromptElement::new("b", array![3, 4]),
        ];
        let batch = PromptElement::stack(&prompts).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.tokens.shape(), &[2, 2]);
        assert_eq!(batch.unstack(), prompts);
        assert!(batch.row(2).is_none());
    }

    #[test]
    fn test_len_and_row_agree_on_unvalidated_batch() {
        let batch = PromptBatch {
            text: vec!["a".into(), "b".into(), "c".into()],
            tokens: array![[1, 2], [3, 4]],
        };
        assert!(batch.validate().is_err());
        assert_eq!(batch.len(), 2);
        assert!(batch.row(2).is_none());
        assert_eq!(batch.unstack().len(), batch.len());
    }
}
