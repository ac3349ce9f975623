//! URL-safe token encoding for JSON values
//!
//! Tokens are base64url without padding. Decoding accepts padded or unpadded
//! tokens and, for links produced before tokens were encoded, raw JSON.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a value as a URL-safe token
pub fn encode_token<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    Ok(TOKEN_ENGINE.encode(json.as_bytes()))
}

/// Decode a token, returning `None` when it cannot be read as `T`
pub fn decode_token<T: DeserializeOwned>(token: &str) -> Option<T> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let decoded = TOKEN_ENGINE
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|json| serde_json::from_str(&json).ok());

    match decoded {
        Some(value) => Some(value),
        None => match serde_json::from_str(token) {
            Ok(value) => {
                tracing::debug!("Decoded legacy raw JSON share token");
                Some(value)
            }
            Err(_) => None,
        },
    }
}
