//! Decoded panel artwork and its `data:` URL encoding.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Raw image bytes returned by the image collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// The MIME media type (e.g., "image/png").
    pub media_type: String,
    /// The decoded image bytes.
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Creates an `ImageData` instance from a base64-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the base64 string cannot be decoded.
    pub fn from_base64(
        base64_str: &str,
        media_type: impl Into<String>,
    ) -> Result<Self, base64::DecodeError> {
        let data = STANDARD.decode(base64_str.trim())?;
        Ok(Self {
            media_type: media_type.into(),
            data,
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Encodes the image as a `data:<media_type>;base64,<payload>` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    /// File extension matching the media type, used when writing panels to disk.
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

impl TryFrom<&str> for ImageData {
    type Error = String;

    fn try_from(data_url: &str) -> Result<Self, Self::Error> {
        let content = data_url.strip_prefix("data:").ok_or("Not a data URL")?;

        let (header, payload) = content
            .split_once(',')
            .ok_or("Invalid data URL format")?;

        let media_type = header
            .split(';')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = if header.contains("base64") {
            STANDARD
                .decode(payload)
                .map_err(|e| format!("Failed to decode base64: {}", e))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self { media_type, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encoding() {
        let img = ImageData::new("image/png", b"Hello".to_vec());
        assert_eq!(img.to_data_url(), "data:image/png;base64,SGVsbG8=");
    }

    #[test]
    fn test_data_url_parsing() {
        let img = ImageData::try_from("data:image/png;base64,SGVsbG8=").unwrap();
        assert_eq!(img.media_type, "image/png");
        assert_eq!(img.data, b"Hello");
    }

    #[test]
    fn test_rejects_non_data_url() {
        assert!(ImageData::try_from("https://example.com/a.png").is_err());
        assert!(ImageData::try_from("data:image/png;base64").is_err());
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        assert!(ImageData::from_base64("***not base64***", "image/png").is_err());
    }

    #[test]
    fn test_extension() {
        assert_eq!(ImageData::new("image/jpeg", vec![]).extension(), "jpg");
        assert_eq!(ImageData::new("image/png", vec![]).extension(), "png");
        assert_eq!(ImageData::new("text/plain", vec![]).extension(), "bin");
    }
}
