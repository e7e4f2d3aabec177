use base64::{engine::general_purpose, Engine};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::CoffeeShopError;

/// Append a relative `path` to `base`, keeping any path prefix `base` already carries.
///
/// Unlike [`Url::join`], a leading `/` on `path` does not discard the base path, so
/// `http://host/v1` joined with `/drinks` gives `http://host/v1/drinks`.
pub fn join_url(base: &str, path: &str) -> Result<Url, CoffeeShopError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    Ok(Url::parse(&joined)?)
}

/// Decode the payload segment of a JWT. The signature is not checked.
pub fn decode_jwt_payload<T: DeserializeOwned>(jwt: &str) -> Result<T, CoffeeShopError> {
    let mut segments = jwt.split('.');
    let body = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(body), Some(_), None) if !body.is_empty() => body,
        _ => {
            return Err(CoffeeShopError::InvalidToken(
                "expected three dot-separated segments".into(),
            ))
        }
    };

    let decoded = general_purpose::URL_SAFE_NO_PAD.decode(body.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&decoded)?)
}
