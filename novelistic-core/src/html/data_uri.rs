//! Conversion between binary images and `data:` URIs

use crate::error::ImageError;
use base64::alphabet;
use base64::engine::general_purpose::{self, GeneralPurpose};
use base64::engine::DecodePaddingMode;
use base64::read::DecoderReader;
use base64::Engine;
use std::borrow::Cow;
use std::io::Read;

/// Accepts payloads with or without trailing padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Bytes and declared media type of a decoded data URI
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Media type as declared in the URI header, lowercased
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Media type to declare in a package manifest.
    ///
    /// Unknown or non-raster declarations fall back to `image/png`, the
    /// extension every exported image carries.
    pub fn media_type(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "image/jpeg",
            "image/gif" => "image/gif",
            "image/webp" => "image/webp",
            "image/svg+xml" => "image/svg+xml",
            _ => "image/png",
        }
    }
}

/// Whether `src` is an inline image that export extracts
pub fn is_image_data_uri(src: &str) -> bool {
    src.get(..11)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("data:image/"))
}

/// Decode a `data:<mime>;base64,<payload>` URI
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, ImageError> {
    let rest = uri
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &uri[5..])
        .ok_or(ImageError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;

    let mut params = header.split(';');
    let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ImageError::UnsupportedEncoding);
    }

    // Wrapped payloads are common in hand-edited content
    let payload: Cow<'_, [u8]> = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(payload.as_bytes())
    };

    let mut data = Vec::with_capacity(payload.len() / 4 * 3);
    DecoderReader::new(payload.as_ref(), &LENIENT)
        .read_to_end(&mut data)
        .map_err(|e| ImageError::Base64(e.to_string()))?;

    Ok(DecodedImage { mime_type, data })
}

/// Encode bytes as a base64 data URI
pub fn encode_data_uri(mime_type: &str, data: &[u8]) -> String {
    let mut uri = String::with_capacity(mime_type.len() + 13 + data.len().div_ceil(3) * 4);
    uri.push_str("data:");
    uri.push_str(mime_type);
    uri.push_str(";base64,");
    general_purpose::STANDARD.encode_string(data, &mut uri);
    uri
}

/// Guess an image media type from its leading bytes, defaulting to PNG
pub fn sniff_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else if data.starts_with(b"BM") {
        "image/bmp"
    } else if looks_like_svg(data) {
        "image/svg+xml"
    } else {
        "image/png"
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}
