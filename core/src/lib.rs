pub mod analytics;
pub mod availability;
pub mod builder;
pub mod cache;
pub mod document;
pub mod engine;
pub mod error;
pub mod merger;
pub mod partition;
pub mod storage;
pub mod tokenizer;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

pub type DocId = u32;

/// One inverted-index entry. The index is binary-presence: a term either
/// occurs in a room document or it does not, so `term_freq` is always 1 and
/// `term_weight` is always 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
    pub term_weight: f32,
}

impl Posting {
    pub fn new(doc_id: DocId) -> Self {
        Posting { doc_id, term_freq: 1, term_weight: 1.0 }
    }
}
