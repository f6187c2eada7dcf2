//! Image decoding seam.
//!
//! Turning bytes into a displayable bitmap belongs to the embedder; the
//! cache only ever calls through [`ImageDecoder`]. What the crate does
//! carry is [`probe_dimensions`], a header-level size sniff for the common
//! texture formats, so transfers can report width/height without a full
//! decode.

use thiserror::Error;

/// Blob is not a valid image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("undecodable image data: {reason}")]
pub struct DecodeError {
    pub reason: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decoding capability supplied by the embedder.
///
/// Implementations must not panic on arbitrary bytes; reject them with a
/// [`DecodeError`] instead.
pub trait ImageDecoder {
    type Image;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, DecodeError>;
}

/// Sniff pixel dimensions from an image header without decoding.
///
/// Understands PNG, GIF and baseline/progressive JPEG. Returns `None` for
/// anything else, including truncated headers.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    probe_png(bytes)
        .or_else(|| probe_gif(bytes))
        .or_else(|| probe_jpeg(bytes))
}

fn probe_png(bytes: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    if bytes.len() < 24 || bytes[..8] != SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

fn probe_gif(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 10 || (&bytes[..6] != b"GIF87a" && &bytes[..6] != b"GIF89a") {
        return None;
    }
    let width = u16::from_le_bytes([bytes[6], bytes[7]]) as u32;
    let height = u16::from_le_bytes([bytes[8], bytes[9]]) as u32;
    Some((width, height))
}

fn probe_jpeg(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 4 || bytes[0] != 0xff || bytes[1] != 0xd8 {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xff {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            // Fill bytes and standalone markers carry no segment.
            0xff => {
                i += 1;
                continue;
            }
            0x01 | 0xd0..=0xd9 => {
                i += 2;
                continue;
            }
            _ => {}
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        if len < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xc0..=0xcf) && !matches!(marker, 0xc4 | 0xc8 | 0xcc);
        if is_sof {
            if i + 9 > bytes.len() {
                return None;
            }
            let height = u16::from_be_bytes([bytes[i + 5], bytes[i + 6]]) as u32;
            let width = u16::from_be_bytes([bytes[i + 7], bytes[i + 8]]) as u32;
            return Some((width, height));
        }
        i += 2 + len;
    }
    None
}
