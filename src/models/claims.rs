use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::{Map, Value};

/// URL-safe alphabet, padding optional. Tokens are normalised to this
/// alphabet before decoding so standard-alphabet payloads also parse.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims read from the payload segment of a JWT.
///
/// The signature is never checked. Values here are display data only; the
/// upstream resource server verifies the bearer token on every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Decodes the payload of a three-segment token.
    ///
    /// Returns `None` for anything malformed: wrong segment count, bad
    /// base64, non-JSON, or a JSON value that is not an object.
    pub fn decode(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = parts[1].replace('+', "-").replace('/', "_");
        let bytes = PAYLOAD_ENGINE.decode(payload).ok()?;

        match serde_json::from_slice(&bytes).ok()? {
            Value::Object(map) => Some(Claims(map)),
            _ => None,
        }
    }

    /// A claim rendered as a string. Missing, null, empty, `false` and `0`
    /// all count as absent.
    pub fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Expiry in seconds since the epoch. Numeric strings are accepted.
    pub fn exp(&self) -> Option<i64> {
        let exp = match self.0.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
            _ => None,
        }?;
        (exp != 0).then_some(exp)
    }
}
