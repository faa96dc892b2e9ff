//! Error types and client-facing constraint codes

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::constraint::ImageTooBig;

pub type Result<T> = std::result::Result<T, ImageError>;

/// Stable codes reported to whoever surfaces a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintCode {
    ImageTooBig,
    Empty,
    NotAnImage,
    UnsupportedType,
    Malformed,
    ContentMismatch,
}

impl ConstraintCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintCode::ImageTooBig => "IMAGE_CONSTRAINT_TOO_BIG",
            ConstraintCode::Empty => "IMAGE_CONSTRAINT_EMPTY",
            ConstraintCode::NotAnImage => "IMAGE_CONSTRAINT_NOT_AN_IMAGE",
            ConstraintCode::UnsupportedType => "IMAGE_CONSTRAINT_UNSUPPORTED_TYPE",
            ConstraintCode::Malformed => "IMAGE_CONSTRAINT_MALFORMED",
            ConstraintCode::ContentMismatch => "IMAGE_CONSTRAINT_CONTENT_MISMATCH",
        }
    }
}

impl fmt::Display for ConstraintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConstraintCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    TooBig(#[from] ImageTooBig),

    #[error("Empty image content")]
    Empty,

    #[error("Content is not an image")]
    NotAnImage,

    #[error("Unsupported image type: {content_type} (allowed: {allowed:?})")]
    UnsupportedType { content_type: String, allowed: Vec<String> },

    #[error("Malformed image content: {0}")]
    Malformed(String),

    #[error("Image content does not match declared type {content_type}")]
    ContentMismatch { content_type: String },
}

impl ValidationError {
    pub fn code(&self) -> ConstraintCode {
        match self {
            ValidationError::TooBig(err) => err.code(),
            ValidationError::Empty => ConstraintCode::Empty,
            ValidationError::NotAnImage => ConstraintCode::NotAnImage,
            ValidationError::UnsupportedType { .. } => ConstraintCode::UnsupportedType,
            ValidationError::Malformed(_) => ConstraintCode::Malformed,
            ValidationError::ContentMismatch { .. } => ConstraintCode::ContentMismatch,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
