use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("buffer too small for {what}: need {needed} bytes, have {available}")]
    BufferTooSmall {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("template {path} could not be read: {reason}")]
    TemplateUnreadable { path: PathBuf, reason: String },

    #[error("template {0} holds no packet")]
    TemplateEmpty(PathBuf),

    #[error("frame does not carry the expected {0} header chain")]
    UnexpectedHeaders(&'static str),
}
