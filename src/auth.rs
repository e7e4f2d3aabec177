//! # auth
//! Builds the Auth0 login and logout redirects from [`Auth0Config`] and turns the
//! access token handed back to the callback URL into a [`Session`].
//!
//! Token signatures are verified by the backend, not here. The client only reads
//! the claims it needs to decide what to offer the user.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::{app_config::Auth0Config, error::CoffeeShopError, utils::decode_jwt_payload};

const AUTH0_HOST_SUFFIX: &str = ".auth0.com";

/// Turn the configured tenant into a host name. A bare tenant prefix such as
/// `example.us` becomes `example.us.auth0.com`; anything already ending in
/// `.auth0.com` is used as is.
pub fn tenant_host(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.ends_with(AUTH0_HOST_SUFFIX) {
        domain.to_string()
    } else {
        format!("{domain}{AUTH0_HOST_SUFFIX}")
    }
}

fn tenant_url(auth0: &Auth0Config, path: &str) -> Result<Url, CoffeeShopError> {
    Ok(Url::parse(&format!("https://{}{path}", tenant_host(&auth0.domain)))?)
}

/// The implicit-flow authorization URL the browser is sent to for login.
pub fn build_login_url(auth0: &Auth0Config) -> Result<Url, CoffeeShopError> {
    let mut url = tenant_url(auth0, "/authorize")?;
    url.query_pairs_mut()
        .append_pair("audience", &auth0.audience)
        .append_pair("response_type", "token")
        .append_pair("client_id", &auth0.client_id)
        .append_pair("redirect_uri", &auth0.callback_url);

    Ok(url)
}

pub fn build_logout_url(auth0: &Auth0Config) -> Result<Url, CoffeeShopError> {
    let mut url = tenant_url(auth0, "/v2/logout")?;
    url.query_pairs_mut()
        .append_pair("client_id", &auth0.client_id)
        .append_pair("returnTo", &auth0.callback_url);

    Ok(url)
}

/// Pull the `access_token` out of the URL fragment Auth0 redirects back with.
pub fn token_from_callback(callback: &str) -> Result<String, CoffeeShopError> {
    let url = Url::parse(callback)?;
    let fragment = url
        .fragment()
        .ok_or_else(|| CoffeeShopError::InvalidToken("callback URL has no fragment".into()))?;

    let mut error = None;
    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" if !value.is_empty() => return Ok(value.into_owned()),
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    Err(CoffeeShopError::InvalidToken(
        error.unwrap_or_else(|| "callback URL carries no access_token".into()),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
    aud: Option<Audience>,
    #[serde(default)]
    permissions: Vec<String>,
}

/// A logged-in user, as far as the access token tells.
#[derive(Debug)]
pub struct Session {
    access_token: String,
    subject: Option<String>,
    permissions: Vec<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn from_token(token: &str, auth0: &Auth0Config) -> Result<Self, CoffeeShopError> {
        Self::from_token_at(token, auth0, Utc::now())
    }

    /// Like [`Session::from_token`], checking expiry against `now`.
    pub fn from_token_at(
        token: &str,
        auth0: &Auth0Config,
        now: DateTime<Utc>,
    ) -> Result<Self, CoffeeShopError> {
        let claims: Claims = decode_jwt_payload(token)?;

        match &claims.aud {
            Some(aud) if aud.contains(&auth0.audience) => {}
            _ => {
                warn!("Rejecting token issued for a different audience");
                return Err(CoffeeShopError::InvalidToken(format!(
                    "token audience does not include '{}'",
                    auth0.audience
                )));
            }
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| CoffeeShopError::InvalidToken("invalid exp timestamp".into()))?;
        if expires_at <= now {
            return Err(CoffeeShopError::InvalidToken(format!(
                "token expired at {expires_at}"
            )));
        }

        debug!(
            "Session for {:?} with {} permissions",
            claims.sub,
            claims.permissions.len()
        );

        Ok(Self {
            access_token: token.to_string(),
            subject: claims.sub,
            permissions: claims.permissions,
            expires_at,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn can(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn require(&self, permission: &str) -> Result<(), CoffeeShopError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(CoffeeShopError::MissingPermission(permission.to_string()))
        }
    }
}
