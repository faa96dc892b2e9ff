//! Per-file reports for images checked on local disk

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constraint::{validate_image, HasSize};
use crate::error::{ConstraintCode, ImageError, Result, ValidationError};
use crate::validator::{ImageUpload, ImageValidator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Rejected { code: ConstraintCode, message: String },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }
}

impl From<&ValidationError> for Outcome {
    fn from(err: &ValidationError) -> Self {
        Outcome::Rejected {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl FileReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Accepted => write!(f, "{}: ok ({} bytes)", self.path.display(), self.size),
            Outcome::Rejected { code, message } => {
                write!(f, "{}: {} {}", self.path.display(), code, message)
            }
        }
    }
}

/// Checks one local file.
///
/// The fixed size limit is applied to the file metadata before any content is
/// read, so oversized files are rejected without loading them.
pub fn check_path(validator: &ImageValidator, path: impl AsRef<Path>) -> Result<FileReport> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ImageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        )));
    }

    if let Err(err) = validate_image(&metadata) {
        info!(path = %path.display(), size = err.size, "Image exceeds the size limit");
        return Ok(FileReport {
            path: path.to_path_buf(),
            size: metadata.len(),
            content_type: None,
            outcome: Outcome::from(&ValidationError::from(err)),
        });
    }

    let upload = ImageUpload::from_path(path)?;
    let outcome = match validator.validate_upload(&upload) {
        Ok(()) => Outcome::Accepted,
        Err(err) => Outcome::from(&err),
    };
    debug!(path = %path.display(), accepted = outcome.is_accepted(), "Checked image");

    Ok(FileReport {
        path: path.to_path_buf(),
        size: upload.size(),
        content_type: Some(upload.content_type),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_error() {
        let outcome = Outcome::from(&ValidationError::NotAnImage);
        assert!(!outcome.is_accepted());
        assert_eq!(
            outcome,
            Outcome::Rejected {
                code: ConstraintCode::NotAnImage,
                message: "Content is not an image".to_string(),
            }
        );
        assert!(Outcome::Accepted.is_accepted());
    }

    #[test]
    fn test_report_json() {
        let report = FileReport {
            path: PathBuf::from("big.png"),
            size: 2_000_000,
            content_type: None,
            outcome: Outcome::Rejected {
                code: ConstraintCode::ImageTooBig,
                message: "Image too big".to_string(),
            },
        };

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["path"], "big.png");
        assert_eq!(value["size"], 2_000_000);
        assert_eq!(value["status"], "rejected");
        assert_eq!(value["code"], "IMAGE_CONSTRAINT_TOO_BIG");
    }

    #[test]
    fn test_report_display() {
        let report = FileReport {
            path: PathBuf::from("small.png"),
            size: 10,
            content_type: Some("image/png".to_string()),
            outcome: Outcome::Accepted,
        };
        assert_eq!(report.to_string(), "small.png: ok (10 bytes)");
    }
}
