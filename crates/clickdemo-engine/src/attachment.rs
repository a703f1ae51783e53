use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

/// Every input is declared as PNG regardless of its real encoding.
pub const ATTACHMENT_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    bytes: Vec<u8>,
    media_type: &'static str,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            media_type: ATTACHMENT_MEDIA_TYPE,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        self.media_type
    }

    pub fn to_part(&self) -> Value {
        json!({
            "inlineData": {
                "mimeType": self.media_type,
                "data": BASE64.encode(&self.bytes),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    Image(ImageAttachment),
}

impl RequestPart {
    pub fn to_part(&self) -> Value {
        match self {
            RequestPart::Text(text) => json!({ "text": text }),
            RequestPart::Image(image) => image.to_part(),
        }
    }
}

/// One multimodal request. The instruction is always the first part so the
/// model reads the task before the images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    parts: Vec<RequestPart>,
}

impl GenerationRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            parts: vec![RequestPart::Text(instruction.into())],
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.parts.push(RequestPart::Image(image));
        self
    }

    pub fn with_images(mut self, images: impl IntoIterator<Item = ImageAttachment>) -> Self {
        self.parts
            .extend(images.into_iter().map(RequestPart::Image));
        self
    }

    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    pub fn instruction(&self) -> &str {
        match self.parts.first() {
            Some(RequestPart::Text(text)) => text,
            _ => "",
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAttachment> {
        self.parts.iter().filter_map(|part| match part {
            RequestPart::Image(image) => Some(image),
            RequestPart::Text(_) => None,
        })
    }

    pub fn to_parts_json(&self) -> Vec<Value> {
        self.parts.iter().map(RequestPart::to_part).collect()
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use serde_json::json;

    use super::*;

    #[test]
    fn attachment_is_tagged_png_without_inspecting_bytes() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("shot.jpg");
        std::fs::write(&path, b"definitely not a png")?;

        let attachment = ImageAttachment::from_path(&path)?;
        assert_eq!(attachment.media_type(), "image/png");
        assert_eq!(attachment.bytes(), b"definitely not a png");

        let part = attachment.to_part();
        assert_eq!(part["inlineData"]["mimeType"], json!("image/png"));
        let data = part["inlineData"]["data"].as_str().unwrap_or_default();
        assert_eq!(BASE64.decode(data)?, b"definitely not a png");
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ImageAttachment::from_path(Path::new("/nonexistent/shot.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/shot.png"));
    }

    #[test]
    fn request_keeps_instruction_first_and_images_in_order() {
        let request = GenerationRequest::new("describe")
            .with_image(ImageAttachment::from_bytes(b"main".to_vec()))
            .with_images(vec![
                ImageAttachment::from_bytes(b"c1".to_vec()),
                ImageAttachment::from_bytes(b"c2".to_vec()),
            ]);

        assert_eq!(request.instruction(), "describe");
        let order: Vec<&[u8]> = request.images().map(ImageAttachment::bytes).collect();
        assert_eq!(order, vec![&b"main"[..], &b"c1"[..], &b"c2"[..]]);

        let parts = request.to_parts_json();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], json!({ "text": "describe" }));
        assert!(parts[1].get("inlineData").is_some());
    }
}
