use std::path::Path;
use tracing::debug;

use crate::config::ImageConfig;
use crate::constraint::{check_size, HasSize, MAX_IMAGE_SIZE};
use crate::data_url::DataUrl;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }

    /// Reads a local file, guessing its media type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(content_type, data))
    }
}

impl HasSize for ImageUpload {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct ImageValidator {
    config: ImageConfig,
}

impl ImageValidator {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(ImageConfig::default())
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn validate_upload(&self, upload: &ImageUpload) -> Result<(), ValidationError> {
        self.validate_bytes(&upload.content_type, &upload.data)
            .map_err(|err| {
                debug!(
                    content_type = %upload.content_type,
                    size = upload.size(),
                    code = %err.code(),
                    "Image upload rejected: {}",
                    err
                );
                err
            })
    }

    /// Validates stored image content given as a data URL and returns it decoded.
    ///
    /// The URL text itself may not exceed [`MAX_IMAGE_SIZE`]; the decoded bytes
    /// are then held to the configured limit.
    pub fn validate_data_url(&self, content: &str) -> Result<DataUrl, ValidationError> {
        let validated = check_size(content.trim().len() as u64, MAX_IMAGE_SIZE)
            .map_err(ValidationError::from)
            .and_then(|()| DataUrl::parse(content))
            .and_then(|url| {
                self.validate_bytes(url.media_type(), url.bytes())?;
                Ok(url)
            });

        if let Err(err) = &validated {
            debug!(code = %err.code(), "Image content rejected: {}", err);
        }

        validated
    }

    fn validate_bytes(&self, content_type: &str, data: &[u8]) -> Result<(), ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::Empty);
        }

        check_size(data.size(), self.config.max_image_size)?;

        let essence = self.validate_content_type(content_type)?;

        if self.config.check_magic_bytes {
            self.validate_magic_bytes(&essence, data)?;
        }

        Ok(())
    }

    fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let mime: mime::Mime = content_type.parse().map_err(|_| {
            ValidationError::Malformed(format!("invalid content type '{}'", content_type))
        })?;

        if mime.type_() != mime::IMAGE {
            return Err(ValidationError::NotAnImage);
        }

        let essence = mime.essence_str().to_ascii_lowercase();
        if !self.config.allows(&essence) {
            return Err(ValidationError::UnsupportedType {
                content_type: essence,
                allowed: self.config.allowed_content_types.clone(),
            });
        }

        Ok(essence)
    }

    fn validate_magic_bytes(&self, content_type: &str, data: &[u8]) -> Result<(), ValidationError> {
        let magic_matches = match content_type {
            "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
            "image/webp" => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
            _ => true,
        };

        if !magic_matches {
            return Err(ValidationError::ContentMismatch {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }
}
