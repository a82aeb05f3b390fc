//! ## Errors
//! The error type shared by the knowledge base, the inference procedures and the TPTP front end.
//! Failed unifications and exhausted time limits are not errors, they are ordinary results.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolError {
    #[error("only atomic queries are supported by {procedure}, got: {query}")]
    InvalidQuery {
        procedure: &'static str,
        query: String,
    },

    #[error("attempted to add an unsatisfiable sentence to the knowledge base: {sentence}")]
    UnsatisfiableAssertion { sentence: String },

    #[error("derived the empty clause while looking for an answer, the premises are unsatisfiable")]
    InconsistentKnowledgeBase,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported input: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, FolError>;
