use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::KeycloakConfig;

pub mod roles;

pub use roles::{ProjectRole, SystemRole};

/// Claims carried by a Keycloak access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakClaims {
    pub sub: Option<String>,
    pub preferred_username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub identity_provider: Option<String>,
    pub idir_user_guid: Option<String>,
    pub bceid_user_guid: Option<String>,
    pub exp: i64,
    pub iat: Option<i64>,
}

impl KeycloakClaims {
    /// Stable identifier of the user at the identity provider.
    ///
    /// Prefers the provider GUID claims; falls back to the part of
    /// `preferred_username` before the `@`.
    pub fn user_identifier(&self) -> String {
        self.idir_user_guid
            .as_deref()
            .or(self.bceid_user_guid.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.preferred_username
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .to_lowercase()
    }

    /// Identity source, e.g. `IDIR` or `BCEIDBASIC`.
    pub fn identity_source(&self) -> String {
        let raw = self.identity_provider.clone().unwrap_or_else(|| {
            self.preferred_username
                .split_once('@')
                .map(|(_, source)| source.to_string())
                .unwrap_or_default()
        });
        raw.replace('-', "").to_uppercase()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token verification is not configured")]
    NotConfigured,
}

/// Verifies bearer tokens issued by the identity provider.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_config(config: &KeycloakConfig) -> Result<Self, AuthError> {
        let (key, algorithm) = if let Some(pem) = &config.public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
            (key, Algorithm::RS256)
        } else if let Some(secret) = config.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
        } else {
            return Err(AuthError::NotConfigured);
        };

        Ok(Self::new(key, algorithm, config.issuer.as_deref(), config.audience.as_deref()))
    }

    pub fn hs256(secret: &str) -> Self {
        Self::new(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256, None, None)
    }

    fn new(key: DecodingKey, algorithm: Algorithm, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(algorithm);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<KeycloakClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if !self.validation.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidToken(format!("unexpected algorithm {:?}", header.alg)));
        }
        let data = decode::<KeycloakClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

/// The authenticated caller, resolved once per request and passed explicitly
/// to the authorization evaluator and services.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPrincipal {
    pub user_identifier: String,
    pub identity_source: String,
    pub username: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub system_user_id: Option<i32>,
    pub system_roles: Vec<String>,
    pub record_active: bool,
    pub has_project_roles: bool,
}

impl AuthPrincipal {
    /// A principal known only from its token, not yet matched to a system user.
    pub fn from_claims(claims: &KeycloakClaims) -> Self {
        Self {
            user_identifier: claims.user_identifier(),
            identity_source: claims.identity_source(),
            username: claims.preferred_username.clone(),
            email: claims.email.clone(),
            display_name: claims.display_name.clone(),
            system_user_id: None,
            system_roles: vec![],
            record_active: false,
            has_project_roles: false,
        }
    }

    pub fn has_system_role(&self, roles: &[SystemRole]) -> bool {
        self.system_roles
            .iter()
            .any(|name| roles.iter().any(|role| role.name() == name))
    }

    pub fn is_system_admin(&self) -> bool {
        self.has_system_role(&[SystemRole::SystemAdmin])
    }

    /// Administrators and maintainers see every record.
    pub fn sees_all_projects(&self) -> bool {
        self.has_system_role(&[SystemRole::SystemAdmin, SystemRole::Maintainer])
    }

    /// Recognized, active and not waiting on an access request.
    pub fn is_valid_system_user(&self) -> bool {
        self.system_user_id.is_some() && self.record_active && (!self.system_roles.is_empty() || self.has_project_roles)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value.strip_prefix("Bearer ").ok_or(AuthError::MalformedHeader)?.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims(username: &str) -> KeycloakClaims {
        KeycloakClaims {
            sub: None,
            preferred_username: username.to_string(),
            email: Some("jane@example.com".to_string()),
            display_name: None,
            identity_provider: None,
            idir_user_guid: None,
            bceid_user_guid: None,
            exp: chrono::Utc::now().timestamp() + 600,
            iat: None,
        }
    }

    #[test]
    fn identifier_prefers_guid_claims() {
        let mut c = claims("JDoe@idir");
        assert_eq!(c.user_identifier(), "jdoe");
        assert_eq!(c.identity_source(), "IDIR");

        c.idir_user_guid = Some("ABC123".to_string());
        assert_eq!(c.user_identifier(), "abc123");

        let c = claims("someone@bceid-basic");
        assert_eq!(c.identity_source(), "BCEIDBASIC");
    }

    #[test]
    fn verifies_hs256_tokens() {
        let token = encode(&Header::default(), &claims("jdoe@idir"), &EncodingKey::from_secret(b"secret")).unwrap();
        let verifier = TokenVerifier::hs256("secret");
        let decoded = verifier.verify(&token).unwrap();
        assert_eq!(decoded.preferred_username, "jdoe@idir");

        let wrong = TokenVerifier::hs256("other");
        assert!(matches!(wrong.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::MalformedHeader)));
        assert!(matches!(bearer_token(Some("Bearer  ")), Err(AuthError::MalformedHeader)));
    }

    #[test]
    fn pending_users_are_not_valid_system_users() {
        let mut principal = AuthPrincipal::from_claims(&claims("jdoe@idir"));
        assert!(!principal.is_valid_system_user());

        principal.system_user_id = Some(4);
        principal.record_active = true;
        assert!(!principal.is_valid_system_user());

        principal.has_project_roles = true;
        assert!(principal.is_valid_system_user());
    }
}
