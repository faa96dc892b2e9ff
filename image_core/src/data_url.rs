//! Parsing of `data:image/...` URLs, the form stored image content takes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;

use crate::constraint::HasSize;
use crate::error::ValidationError;

const DATA_IMAGE_PREFIX: &str = "data:image";

lazy_static! {
    static ref IMAGE_MEDIA_TYPE: Regex =
        Regex::new(r"^image/[a-z0-9][a-z0-9.+-]*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    media_type: String,
    base64: bool,
    bytes: Vec<u8>,
}

impl DataUrl {
    /// Parses `data:<media-type>[;params][;base64],<payload>`.
    ///
    /// Content that is blank or does not start with `data:image` is rejected
    /// before any decoding happens.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::Empty);
        }

        if !input.starts_with(DATA_IMAGE_PREFIX) {
            return Err(ValidationError::NotAnImage);
        }

        let (header, payload) = input["data:".len()..]
            .split_once(',')
            .ok_or_else(|| ValidationError::Malformed("missing ',' after header".to_string()))?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !IMAGE_MEDIA_TYPE.is_match(&media_type) {
            return Err(ValidationError::Malformed(format!(
                "invalid media type '{}'",
                media_type
            )));
        }

        let base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));
        let bytes = if base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| ValidationError::Malformed(format!("invalid base64 payload: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self { media_type, base64, bytes })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn is_base64(&self) -> bool {
        self.base64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl HasSize for DataUrl {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
