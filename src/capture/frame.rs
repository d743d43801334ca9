use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;

use crate::error::{FlowError, FlowResult};

pub const JPEG_MIME: &str = "image/jpeg";

/// One RGBA8 buffer as handed over by the device.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// A still snapshot, encoded as a `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFrame {
    data_uri: String,
    captured_at: DateTime<Utc>,
}

impl ImageFrame {
    /// Wrap an already-encoded data URI. The URI is not checked here; the
    /// invoker validates it against the contract's input schema.
    pub fn from_data_uri(data_uri: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            data_uri: data_uri.into(),
            captured_at,
        }
    }

    /// Encode a raw RGBA buffer as JPEG. Alpha is dropped.
    pub fn encode_jpeg(raw: &RawFrame, captured_at: DateTime<Utc>) -> FlowResult<Self> {
        if raw.is_empty() {
            return Err(FlowError::Capture("frame buffer is empty".into()));
        }

        let rgba = RgbaImage::from_raw(raw.width, raw.height, raw.pixels.clone()).ok_or_else(
            || {
                FlowError::Capture(format!(
                    "frame buffer holds {} bytes, expected {} for {}x{}",
                    raw.pixels.len(),
                    raw.width as usize * raw.height as usize * 4,
                    raw.width,
                    raw.height
                ))
            },
        )?;

        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut encoded, ImageFormat::Jpeg)
            .map_err(|err| FlowError::Capture(format!("jpeg encoding failed: {err}")))?;

        let payload = STANDARD.encode(encoded.into_inner());
        Ok(Self {
            data_uri: format!("data:{JPEG_MIME};base64,{payload}"),
            captured_at,
        })
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Size of the encoded URI, used for log lines.
    pub fn encoded_len(&self) -> usize {
        self.data_uri.len()
    }
}
