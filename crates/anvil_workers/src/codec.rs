//! Byte encoding of isolated parameters.
//!
//! A payload is framed the same way as every other binary artifact in the
//! workspace: a 4-byte little-endian header length, a bincode header carrying
//! magic bytes, format version, parameter type name and payload checksum, and
//! the bincode-encoded value tree.

use anvil_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::WorkError;
use crate::isolation::Isolatable;
use crate::value::IsolatedValue;

/// Magic bytes identifying an isolated parameter payload.
const PAYLOAD_MAGIC: [u8; 4] = *b"ANVW";

/// Current payload format version.
const PAYLOAD_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PayloadHeader {
    magic: [u8; 4],
    format_version: u32,
    type_name: String,
    checksum: ContentHash,
}

/// Encodes and decodes [`Isolatable`] snapshots.
///
/// Decoding checks integrity and that the payload was produced for the
/// requested parameter type; any mismatch is a decode-phase fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolatableSerializerRegistry;

impl IsolatableSerializerRegistry {
    /// Creates a registry.
    pub fn new() -> Self {
        Self
    }

    /// Writes a snapshot to bytes.
    pub fn write_isolatable<T>(&self, isolatable: &Isolatable<T>) -> Result<Vec<u8>, WorkError> {
        let type_name = isolatable.type_name();
        let payload = bincode::serde::encode_to_vec(isolatable.value(), bincode::config::standard())
            .map_err(|e| WorkError::encode(type_name, e))?;

        let header = PayloadHeader {
            magic: PAYLOAD_MAGIC,
            format_version: PAYLOAD_FORMAT_VERSION,
            type_name: type_name.to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| WorkError::encode(type_name, e))?;

        let header_len = u32::try_from(header_bytes.len())
            .map_err(|_| WorkError::encode(type_name, "header too large"))?;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);
        Ok(output)
    }

    /// Reads a snapshot of a `T` back from bytes.
    pub fn read_isolatable<T>(&self, bytes: &[u8]) -> Result<Isolatable<T>, WorkError> {
        let expected = std::any::type_name::<T>();
        let (type_name, value) = self.read_untyped(bytes, expected)?;
        if type_name != expected {
            return Err(WorkError::decode(
                expected,
                format!("payload was produced for `{type_name}`"),
            ));
        }
        Ok(Isolatable::from_parts(type_name, value))
    }

    /// Reads the type name and value tree without checking the type.
    fn read_untyped(
        &self,
        raw: &[u8],
        expected: &str,
    ) -> Result<(String, IsolatedValue), WorkError> {
        let fault = |reason: &str| WorkError::decode(expected, reason);

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| fault("payload truncated before header"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_bytes = raw
            .get(4..4 + header_len)
            .ok_or_else(|| fault("payload truncated inside header"))?;

        let (header, _): (PayloadHeader, usize) =
            bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
                .map_err(|e| WorkError::decode(expected, format!("bad header: {e}")))?;
        if header.magic != PAYLOAD_MAGIC {
            return Err(fault("not an isolated parameter payload"));
        }
        if header.format_version != PAYLOAD_FORMAT_VERSION {
            return Err(WorkError::decode(
                expected,
                format!("unsupported payload format version {}", header.format_version),
            ));
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return Err(fault("payload checksum mismatch"));
        }

        let (value, read): (IsolatedValue, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| WorkError::decode(expected, e))?;
        if read != payload.len() {
            return Err(fault("trailing bytes after payload"));
        }
        Ok((header.type_name, value))
    }
}
