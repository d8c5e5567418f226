//! Message body extraction.
//!
//! A message body lives either in the plain-text column or inside a legacy
//! `attributedBody` blob (a typedstream archive). The blob format is
//! undocumented; the decoder pattern-matches the observed byte layout and is
//! kept behind a trait so an alternate decoder can be substituted without
//! touching callers.

use thiserror::Error;

/// Marker preceding the string payload inside an attributed body blob.
const STRING_MARKER: &[u8] = b"NSString";

/// Fixed-size preamble between the marker and the length field,
/// typically `\x01\x94\x84\x01+`.
const PREAMBLE_LEN: usize = 5;

/// Sentinel byte announcing a two-byte little-endian length field.
const WIDE_LENGTH_SENTINEL: u8 = 0x81;

/// Placeholder body for attachment-only messages.
pub const ATTACHMENT_PLACEHOLDER: &str = "[attachment]";

/// Ways an attributed body blob can defeat the decoder.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No string marker anywhere in the blob.
    #[error("string marker not found in attributed body")]
    MarkerMissing,

    /// Blob ends before the length field is complete.
    #[error("attributed body truncated before length field")]
    TruncatedLength,

    /// Declared length runs past the end of the blob.
    #[error("string payload of {length} bytes exceeds remaining blob")]
    PayloadOutOfBounds { length: usize },

    /// Payload bytes are not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Capability interface for attributed-body decoding.
pub trait BodyDecoder {
    /// Extract the human-readable string payload from a raw blob.
    ///
    /// # Errors
    /// Returns a `DecodeError` describing the malformation.
    fn decode(&self, blob: &[u8]) -> Result<String, DecodeError>;
}

/// Decoder for the typedstream layout observed in Messages databases.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypedStreamDecoder;

impl BodyDecoder for TypedStreamDecoder {
    fn decode(&self, blob: &[u8]) -> Result<String, DecodeError> {
        let marker_pos = find_subsequence(blob, STRING_MARKER).ok_or(DecodeError::MarkerMissing)?;
        let payload = &blob[marker_pos + STRING_MARKER.len()..];
        let payload = payload
            .get(PREAMBLE_LEN..)
            .ok_or(DecodeError::TruncatedLength)?;

        let sentinel = *payload.first().ok_or(DecodeError::TruncatedLength)?;
        let (length, text_start) = if sentinel == WIDE_LENGTH_SENTINEL {
            let bytes = payload.get(1..3).ok_or(DecodeError::TruncatedLength)?;
            (usize::from(u16::from_le_bytes([bytes[0], bytes[1]])), 3)
        } else {
            (usize::from(sentinel), 1)
        };

        let raw = payload
            .get(text_start..text_start + length)
            .ok_or(DecodeError::PayloadOutOfBounds { length })?;

        Ok(std::str::from_utf8(raw)?.to_string())
    }
}

/// Extract a message body from either the plain-text column or the
/// attributed body blob.
///
/// Plain text wins when present. Blob decoding failures are recovered as an
/// empty body; losing one message beats failing the pipeline. When the row
/// signals attachments and no text was recovered, a fixed placeholder stands
/// in.
pub fn extract_message_body(
    text: Option<&str>,
    blob: Option<&[u8]>,
    has_attachments: bool,
    decoder: &dyn BodyDecoder,
) -> String {
    let body = match text {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => blob.map_or_else(String::new, |bytes| {
            decoder.decode(bytes).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Failed to decode attributed body");
                String::new()
            })
        }),
    };

    if body.is_empty() && has_attachments {
        return ATTACHMENT_PLACEHOLDER.to_string();
    }

    body
}

/// Position of the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::encode_attributed_body;

    const DECODER: TypedStreamDecoder = TypedStreamDecoder;

    #[test]
    fn test_plain_text_wins_over_blob() {
        let blob = encode_attributed_body("from the blob");
        let body = extract_message_body(Some("plain"), Some(&blob), false, &DECODER);
        assert_eq!(body, "plain");
    }

    #[test]
    fn test_decodes_short_body() {
        let blob = encode_attributed_body("hello there");
        assert_eq!(DECODER.decode(&blob).unwrap(), "hello there");
    }

    #[test]
    fn test_decodes_wide_length_body() {
        // Anything 0x80 bytes or longer uses the 0x81 two-byte length form.
        let long_text = "a".repeat(300);
        let blob = encode_attributed_body(&long_text);
        assert_eq!(DECODER.decode(&blob).unwrap(), long_text);
    }

    #[test]
    fn test_missing_marker_errors() {
        let err = DECODER.decode(b"streamtyped garbage").unwrap_err();
        assert!(matches!(err, DecodeError::MarkerMissing));
    }

    #[test]
    fn test_truncated_before_length_recovers_empty() {
        // Marker present but the blob ends inside the preamble.
        let blob = b"NSString\x01\x94".to_vec();
        assert!(matches!(
            DECODER.decode(&blob),
            Err(DecodeError::TruncatedLength)
        ));

        let body = extract_message_body(None, Some(&blob), false, &DECODER);
        assert_eq!(body, "");
    }

    #[test]
    fn test_length_past_end_recovers_empty() {
        let mut blob = encode_attributed_body("hi");
        blob.truncate(blob.len() - 1);
        let body = extract_message_body(None, Some(&blob), false, &DECODER);
        assert_eq!(body, "");
    }

    #[test]
    fn test_attachment_placeholder_when_no_text() {
        let body = extract_message_body(None, None, true, &DECODER);
        assert_eq!(body, ATTACHMENT_PLACEHOLDER);

        // Text recovered: no placeholder even with attachments.
        let body = extract_message_body(Some("photo caption"), None, true, &DECODER);
        assert_eq!(body, "photo caption");
    }

    #[test]
    fn test_no_text_no_blob_is_empty() {
        assert_eq!(extract_message_body(None, None, false, &DECODER), "");
        assert_eq!(extract_message_body(Some(""), None, false, &DECODER), "");
    }
}
