//! Compact serialization
//!
//! `base64url(header) "." base64url(payload) "." base64url(signature)`, without
//! padding (RFC 7515 §7.1). Everything here is a pure function.

use crate::error::{JwtError, JwtResult};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

const SEPARATOR: char = '.';

/// Decoded JOSE header. Only `alg` is read; other members are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    /// Algorithm identifier
    pub alg: String,
}

/// The three segments of a compact token, borrowed from the token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    /// Encoded header
    pub header: &'a str,
    /// Encoded payload
    pub payload: &'a str,
    /// Encoded signature
    pub signature: &'a str,
    /// `header "." payload`, exactly as it appears in the token
    pub signing_input: &'a str,
}

/// Base64url encoding without padding
#[inline]
#[must_use]
pub fn encode_segment(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Base64url decoding without padding.
///
/// # Errors
/// [`JwtError::MalformedToken`] on padding, characters outside the URL-safe
/// alphabet, impossible lengths or non-canonical trailing bits.
#[inline]
pub fn decode_segment(segment: &str) -> JwtResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::malformed(format!("invalid base64url segment: {e}")))
}

/// Encoded header segment for `{"alg":"<algorithm>"}`.
#[must_use]
pub fn header_segment(algorithm: &str) -> String {
    let header = serde_json::json!({ "alg": algorithm });
    encode_segment(header.to_string().as_bytes())
}

/// Decode and parse a header segment.
///
/// # Errors
/// [`JwtError::MalformedToken`] when the segment is not base64url or not a JSON
/// object with a string `alg` member.
pub fn decode_header(segment: &str) -> JwtResult<Header> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| JwtError::malformed(format!("invalid header: {e}")))
}

/// Bytes that get signed: `header_segment "." base64url(payload_json)`.
#[must_use]
pub fn signing_input(header_segment: &str, payload_json: &[u8]) -> String {
    let payload = encode_segment(payload_json);
    let mut input = String::with_capacity(header_segment.len() + 1 + payload.len());
    input.push_str(header_segment);
    input.push(SEPARATOR);
    input.push_str(&payload);
    input
}

/// Append the signature segment to a signing input.
#[must_use]
pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
    let signature = encode_segment(signature);
    let mut token = String::with_capacity(signing_input.len() + 1 + signature.len());
    token.push_str(signing_input);
    token.push(SEPARATOR);
    token.push_str(&signature);
    token
}

/// Split a token into its segments.
///
/// # Errors
/// [`JwtError::MalformedToken`] unless there are exactly three non-empty
/// segments separated by exactly two separators.
pub fn split(token: &str) -> JwtResult<Segments<'_>> {
    let mut parts = token.split(SEPARATOR);
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::malformed("token must have exactly three segments"));
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(JwtError::malformed("token segments must not be empty"));
    }

    Ok(Segments {
        header,
        payload,
        signature,
        signing_input: &token[..header.len() + 1 + payload.len()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_accepts_three_segments() {
        let segments = split("aGVhZA.cGF5bG9hZA.c2ln").unwrap();
        assert_eq!(segments.header, "aGVhZA");
        assert_eq!(segments.payload, "cGF5bG9hZA");
        assert_eq!(segments.signature, "c2ln");
        assert_eq!(segments.signing_input, "aGVhZA.cGF5bG9hZA");
    }

    #[test]
    fn split_rejects_wrong_structure() {
        for token in [
            "",
            "a",
            "a.b",
            "a.b.c.d",
            "a..c",
            ".b.c",
            "a.b.",
            "a.b..c",
            "..",
        ] {
            assert!(split(token).unwrap_err().is_malformed(), "{token:?}");
        }
    }

    #[test]
    fn decode_rejects_padding_and_foreign_alphabet() {
        assert!(decode_segment("YQ==").is_err());
        assert!(decode_segment("a+b/").is_err());
        assert!(decode_segment("a").is_err());
        assert_eq!(decode_segment("YQ").unwrap(), b"a");
    }

    #[test]
    fn decode_rejects_non_canonical_trailing_bits() {
        // "YR" decodes to 'a' only if trailing bits are ignored.
        assert!(decode_segment("YR").is_err());
    }

    #[test]
    fn header_tolerates_unknown_members() {
        let segment = encode_segment(br#"{"typ":"JWT","kid":"k1","alg":"ES256"}"#);
        assert_eq!(decode_header(&segment).unwrap().alg, "ES256");
    }

    #[test]
    fn header_without_alg_is_malformed() {
        let segment = encode_segment(br#"{"typ":"JWT"}"#);
        assert!(decode_header(&segment).unwrap_err().is_malformed());
        let segment = encode_segment(br#"{"alg":7}"#);
        assert!(decode_header(&segment).unwrap_err().is_malformed());
    }

    #[test]
    fn signing_input_and_assemble_compose() {
        let input = signing_input(&header_segment("HS256"), br#"{"sub":"x"}"#);
        assert_eq!(input, "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0");
        let token = assemble(&input, &[0xff, 0xee]);
        assert_eq!(token, "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0._-4");
        assert_eq!(split(&token).unwrap().signing_input, input);
    }
}
