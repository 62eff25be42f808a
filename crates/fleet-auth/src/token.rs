//! HS256 access/refresh token pairs and opaque invitation tokens.
//!
//! Both tokens are self-contained JWTs signed with the same secret. A
//! `typ` claim separates them so one can never be replayed as the other.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use fleet_core::context::Principal;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

const TYPE_ACCESS: &str = "access";
const TYPE_REFRESH: &str = "refresh";

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: app user ID.
    pub sub: String,
    pub email: String,
    pub display_name: String,
    pub is_superadmin: bool,
    pub typ: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn into_principal(self) -> Principal {
        Principal {
            user_id: self.sub,
            email: self.email,
            display_name: self.display_name,
            is_superadmin: self.is_superadmin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenClaims {
    sub: String,
    typ: String,
    iss: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Issues and verifies token pairs. The keys are derived once and
/// read-only afterwards.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_lifetime: i64,
    refresh_lifetime: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.jwt_issuer.clone(),
            access_lifetime: config.access_token_lifetime_secs as i64,
            refresh_lifetime: config.refresh_token_lifetime_secs as i64,
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        self.issue_at(principal, Utc::now().timestamp())
    }

    fn issue_at(&self, principal: &Principal, now: i64) -> Result<TokenPair, AuthError> {
        let access = AccessTokenClaims {
            sub: principal.user_id.clone(),
            email: principal.email.clone(),
            display_name: principal.display_name.clone(),
            is_superadmin: principal.is_superadmin,
            typ: TYPE_ACCESS.into(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.access_lifetime,
            jti: Uuid::new_v4().to_string(),
        };
        let refresh = RefreshTokenClaims {
            sub: principal.user_id.clone(),
            typ: TYPE_REFRESH.into(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.refresh_lifetime,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_in: self.access_lifetime,
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        jsonwebtoken::decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })
    }

    /// Verify signature, issuer, expiry and type of an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let claims: AccessTokenClaims = self.decode(token)?;
        if claims.typ != TYPE_ACCESS {
            return Err(AuthError::TokenInvalid("not an access token".into()));
        }
        Ok(claims)
    }

    /// Verify a refresh token and return its subject.
    pub fn verify_refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims: RefreshTokenClaims = self.decode(token)?;
        if claims.typ != TYPE_REFRESH {
            return Err(AuthError::TokenInvalid("not a refresh token".into()));
        }
        Ok(claims.sub)
    }
}

/// Random single-use invitation token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_invitation_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_issuer: "fleet-test".into(),
            ..Default::default()
        })
    }

    fn principal() -> Principal {
        Principal {
            user_id: Uuid::new_v4().to_string(),
            email: "u@example.com".into(),
            display_name: "U".into(),
            is_superadmin: false,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let svc = service();
        let who = principal();
        let pair = svc.issue(&who).unwrap();

        let claims = svc.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, who.user_id);
        assert_eq!(claims.email, "u@example.com");
        assert_eq!(claims.iss, "fleet-test");
        assert_eq!(claims.into_principal(), who);
        assert_eq!(pair.expires_in, 3600);
    }

    #[test]
    fn refresh_token_yields_subject() {
        let svc = service();
        let who = principal();
        let pair = svc.issue(&who).unwrap();
        assert_eq!(svc.verify_refresh(&pair.refresh_token).unwrap(), who.user_id);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let svc = service();
        let pair = svc.issue(&principal()).unwrap();

        assert!(matches!(
            svc.verify_refresh(&pair.access_token),
            Err(AuthError::TokenInvalid(_))
        ));
        assert!(matches!(
            svc.verify_access(&pair.refresh_token),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let svc = service();
        let long_ago = Utc::now().timestamp() - 30 * 24 * 3600;
        let pair = svc.issue_at(&principal(), long_ago).unwrap();

        assert!(matches!(
            svc.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            svc.verify_refresh(&pair.refresh_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn foreign_secret_or_issuer_is_rejected() {
        let pair = service().issue(&principal()).unwrap();

        let other_secret = TokenService::new(&AuthConfig {
            jwt_secret: "another".into(),
            jwt_issuer: "fleet-test".into(),
            ..Default::default()
        });
        assert!(other_secret.verify_access(&pair.access_token).is_err());

        let other_issuer = TokenService::new(&AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_issuer: "someone-else".into(),
            ..Default::default()
        });
        assert!(other_issuer.verify_access(&pair.access_token).is_err());
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            service().verify_refresh("garbage"),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn invitation_token_is_url_safe() {
        let token = generate_invitation_token();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_invitation_token());
    }
}
