//! Upload constraints for images: the fixed size limit, plus content checks
//! for raw uploads and `data:image` URLs.

pub mod config;
pub mod constraint;
pub mod data_url;
pub mod error;
pub mod report;
pub mod validator;

pub use crate::config::ImageConfig;
pub use crate::constraint::{validate_image, HasSize, ImageTooBig, MAX_IMAGE_SIZE};
pub use crate::data_url::DataUrl;
pub use crate::error::{ConstraintCode, ImageError, Result, ValidationError};
pub use crate::report::{check_path, FileReport, Outcome};
pub use crate::validator::{ImageUpload, ImageValidator};
