//! Cache slot fingerprints and entry-name codec.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use super::expiry::Ticks;

/// Stable identifier for a cache slot, derived from the logical key (the
/// resource URL).
///
/// Equal keys always produce equal fingerprints, and the derivation is
/// stable across process runs, so entries written by an earlier run stay
/// addressable. Distinct keys hashing to the same fingerprint share a slot;
/// with 64 bits of SHA-256 behind it that is a theoretical rather than a
/// practical concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Derive the fingerprint for a logical key.
    pub fn of(key: &str) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(raw))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Malformed entry filename.
///
/// Callers treat this as "entry absent": a file whose name does not decode
/// is skipped, never surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("expected 4 '_'-separated fields, got {0}")]
    FieldCount(usize),

    #[error("field {index} ({text:?}) is not numeric")]
    Field { index: usize, text: String },
}

/// The metadata an entry filename carries. The blob itself is the file
/// content; everything else lives in the name:
/// `"{fingerprint}_{expiresAt}_{width}_{height}"`, no extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub fingerprint: Fingerprint,
    pub expires_at: Ticks,
    pub width: u32,
    pub height: u32,
}

impl EntryMeta {
    /// Render the on-disk filename for this entry.
    pub fn encode_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.fingerprint, self.expires_at, self.width, self.height
        )
    }

    /// Parse an on-disk filename back into metadata.
    ///
    /// The fingerprint field is 1-16 hex digits; the remaining three fields
    /// are decimal. Anything else is a [`NameError`].
    pub fn decode_name(name: &str) -> Result<Self, NameError> {
        let fields: Vec<&str> = name.split('_').collect();
        if fields.len() != 4 {
            return Err(NameError::FieldCount(fields.len()));
        }

        let fingerprint = parse_hex_field(0, fields[0])?;
        let expires_at: Ticks = parse_dec_field(1, fields[1])?;
        let width: u32 = parse_dec_field(2, fields[2])?;
        let height: u32 = parse_dec_field(3, fields[3])?;

        Ok(Self {
            fingerprint: Fingerprint(fingerprint),
            expires_at,
            width,
            height,
        })
    }
}

fn parse_hex_field(index: usize, text: &str) -> Result<u64, NameError> {
    let valid = !text.is_empty()
        && text.len() <= 16
        && text.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return Err(NameError::Field {
            index,
            text: text.to_string(),
        });
    }
    u64::from_str_radix(text, 16).map_err(|_| NameError::Field {
        index,
        text: text.to_string(),
    })
}

fn parse_dec_field<T: std::str::FromStr>(index: usize, text: &str) -> Result<T, NameError> {
    let valid = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(NameError::Field {
            index,
            text: text.to_string(),
        });
    }
    text.parse::<T>().map_err(|_| NameError::Field {
        index,
        text: text.to_string(),
    })
}
