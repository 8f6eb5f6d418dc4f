use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};

const SVG_MIME: &str = "image/svg+xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub data_uri: String,
    pub mime: String,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response body is empty")]
    Empty,
    #[error("unrecognised image data (content type {content_type:?})")]
    UnknownFormat { content_type: Option<String> },
    #[error("failed to read {format} header: {message}")]
    Header { format: String, message: String },
}

pub trait DataUriEncoder: Send + Sync {
    fn encode(&self, bytes: &[u8], content_type: Option<&str>)
        -> Result<DecodedImage, DecodeError>;
}

/// Sniffs the image format from magic bytes, validates the header, and
/// base64-encodes the payload. SVG is accepted only on the server's word.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDataUriEncoder;

impl DataUriEncoder for ImageDataUriEncoder {
    fn encode(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        match image::guess_format(bytes) {
            Ok(format) => encode_raster(bytes, format),
            Err(_) if content_type.is_some_and(is_svg) => Ok(DecodedImage {
                data_uri: data_uri(SVG_MIME, bytes),
                mime: SVG_MIME.to_string(),
                dimensions: None,
            }),
            Err(_) => Err(DecodeError::UnknownFormat {
                content_type: content_type.map(str::to_string),
            }),
        }
    }
}

fn encode_raster(bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError> {
    let dimensions = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|err| DecodeError::Header {
            format: format!("{format:?}"),
            message: err.to_string(),
        })?;
    let mime = format.to_mime_type();
    Ok(DecodedImage {
        data_uri: data_uri(mime, bytes),
        mime: mime.to_string(),
        dimensions: Some(dimensions),
    })
}

fn is_svg(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|ct| ct.eq_ignore_ascii_case(SVG_MIME))
}

/// `data:{mime};base64,{payload}`
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
