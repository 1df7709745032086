use error_stack::Report;
use serde::Deserialize;
use tracing::info;

use crate::ArwLock;

pub type OAuthResult<T> = Result<T, Report<MissingOAuthProperty>>;

#[derive(Debug, thiserror::Error)]
#[error("{0} oauth property not specified")]
pub struct MissingOAuthProperty(&'static str);

/// Where tokens come from and how to read roles out of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub jwks_url: String,
    pub issuer_url: String,
    /// Dot separated path to the roles array in the JWT, e.g. `realm_access.roles`
    pub roles_claims_path: String,
    /// Expected `aud` claim
    pub audience: String,
}

const OAUTH_JWKS_URL: &str = "OAUTH_JWKS_URL";
const OAUTH_ISSUER_URL: &str = "OAUTH_ISSUER_URL";
const OAUTH_ROLES_JWT_PATH: &str = "OAUTH_ROLES_JWT_PATH";
const OAUTH_AUDIENCE: &str = "OAUTH_AUDIENCE";
const DEFAULT_AUDIENCE: &str = "catalog-api";

impl OAuthConfig {
    pub fn from_env() -> OAuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> OAuthResult<Self> {
        let required = |key: &'static str| {
            lookup(key).ok_or_else(|| Report::new(MissingOAuthProperty(key)))
        };

        Ok(Self {
            jwks_url: required(OAUTH_JWKS_URL)?,
            issuer_url: required(OAUTH_ISSUER_URL)?,
            roles_claims_path: required(OAUTH_ROLES_JWT_PATH)?,
            audience: lookup(OAUTH_AUDIENCE).unwrap_or_else(|| {
                info!("{OAUTH_AUDIENCE} not specified, using '{DEFAULT_AUDIENCE}'");
                String::from(DEFAULT_AUDIENCE)
            }),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JwksState {
    pub keys: ArwLock<Vec<Jwk>>,
}

impl JwksState {
    pub async fn find_key(&self, kid: &str) -> Option<Jwk> {
        let keys = self.keys.read().await;
        keys.iter().find(|k| k.kid == kid).cloned()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// RSA public key, as published by the issuer. Other members of the key are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct Jwk {
    pub kid: String,
    /// modulus
    pub n: String,
    /// exponent
    pub e: String,
}
