use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    domain::{Role, Viewer},
    error::{AppError, Result},
};

/// Claims carried by the identity provider's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Numeric user id used as `authorId`.
    pub uid: i64,
    pub role: Role,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub subject: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::User { id: self.id, role: self.role }
    }
}

/// Verifies bearer tokens. Issuing them is the identity provider's job;
/// `issue` exists for seeding and tests.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    audience: Option<String>,
    issuer: Option<String>,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CurrentUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })?;

        Ok(CurrentUser {
            id: data.claims.uid,
            subject: data.claims.sub,
            role: data.claims.role,
        })
    }

    pub fn issue(&self, uid: i64, role: Role, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: format!("local|{}", uid),
            uid,
            role,
            exp: (Utc::now() + ttl).timestamp() as usize,
            aud: self.audience.clone(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }
}
