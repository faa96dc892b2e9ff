//! The fixed size limit every uploaded image must respect.

use std::fs::Metadata;
use thiserror::Error;

use crate::error::ConstraintCode;

/// Largest accepted image in bytes (1 MiB). Sizes equal to the limit pass.
pub const MAX_IMAGE_SIZE: u64 = 1_048_576;

/// Anything that can report its length in bytes.
pub trait HasSize {
    fn size(&self) -> u64;
}

impl HasSize for u64 {
    fn size(&self) -> u64 {
        *self
    }
}

impl HasSize for [u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl HasSize for Vec<u8> {
    fn size(&self) -> u64 {
        self.len() as u64
    }
}

impl HasSize for Metadata {
    fn size(&self) -> u64 {
        self.len()
    }
}

impl<T: HasSize + ?Sized> HasSize for &T {
    fn size(&self) -> u64 {
        (**self).size()
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Image too big: {size} bytes (max: {max_size} bytes)")]
pub struct ImageTooBig {
    pub size: u64,
    pub max_size: u64,
}

impl ImageTooBig {
    pub fn code(&self) -> ConstraintCode {
        ConstraintCode::ImageTooBig
    }
}

/// Checks `file` against [`MAX_IMAGE_SIZE`].
///
/// Pure and side-effect free: the outcome depends on the reported size only.
pub fn validate_image<F: HasSize + ?Sized>(file: &F) -> Result<(), ImageTooBig> {
    check_size(file.size(), MAX_IMAGE_SIZE)
}

pub(crate) fn check_size(size: u64, max_size: u64) -> Result<(), ImageTooBig> {
    if size > max_size {
        return Err(ImageTooBig { size, max_size });
    }
    Ok(())
}
