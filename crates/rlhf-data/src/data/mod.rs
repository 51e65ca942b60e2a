//! Element and batch records exchanged between pipeline stages.
//!
//! Each concept comes as an element (one example, 1-D fields) and a batch
//! (the same fields with a leading batch dimension).

mod accelerate;
mod ilql;
mod ppo;
mod prompt;

pub use accelerate::{RLBatchElement, RLElement};
pub use ilql::{ILQLBatch, ILQLElement, ILQLSeq2SeqBatch, ILQLSeq2SeqElement};
pub use ppo::{PPORLBatch, PPORLElement};
pub use prompt::{PromptBatch, PromptElement};
