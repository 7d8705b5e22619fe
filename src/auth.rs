//! Admin login and bearer tokens.
//!
//! Tokens are compact HS256 JWTs carrying `sub`, `iat` and `exp`.

use crate::config::AuthSettings;
use crate::error::{HelperError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Encoded `{"alg":"HS256","typ":"JWT"}`.
const HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Body returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Checks the single admin credential and signs/verifies tokens.
pub struct AuthService {
    username: String,
    password: String,
    secret: Vec<u8>,
    lifetime: Duration,
}

impl AuthService {
    pub fn new(settings: &AuthSettings) -> Self {
        if settings.uses_default_secrets() {
            warn!("Admin password or signing secret is the built-in default; set ADMIN_PASSWORD and SECRET_KEY");
        }
        Self {
            username: settings.admin_username.clone(),
            password: settings.admin_password.clone(),
            secret: settings.secret_key.as_bytes().to_vec(),
            lifetime: Duration::minutes(settings.token_minutes.max(1)),
        }
    }

    /// Exchange the admin credential for a bearer token.
    pub fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        if username != self.username || password != self.password {
            debug!("Rejected login for '{}'", username);
            return Err(HelperError::Unauthorized("Incorrect username or password".to_string()));
        }
        Ok(TokenResponse {
            access_token: self.issue_at(&self.username, Utc::now())?,
            token_type: "bearer".to_string(),
        })
    }

    fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", HEADER, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input).finalize().into_bytes());
        Ok(format!("{}.{}", signing_input, signature))
    }

    fn mac(&self, signing_input: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        mac
    }

    /// Verify signature, expiry and that the subject is the admin.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let invalid = || HelperError::Unauthorized("Invalid token".to_string());

        let (signing_input, signature) = token.rsplit_once('.').ok_or_else(invalid)?;
        let (header, payload) = signing_input.split_once('.').ok_or_else(invalid)?;
        if payload.contains('.') {
            return Err(invalid());
        }

        let header: TokenHeader = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;
        if header.alg != "HS256" {
            return Err(invalid());
        }

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        self.mac(signing_input)
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(invalid());
        }
        if claims.sub != self.username {
            return Err(HelperError::Unauthorized("Invalid token subject".to_string()));
        }
        Ok(claims)
    }

    /// Validate an `Authorization` header value.
    pub fn authorize_header(&self, header: Option<&str>) -> Result<Claims> {
        let header = header.ok_or_else(|| HelperError::Unauthorized("Missing Authorization header".to_string()))?;
        match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
                self.verify(token.trim())
            }
            _ => Err(HelperError::Unauthorized("Invalid Authorization header".to_string())),
        }
    }
}
