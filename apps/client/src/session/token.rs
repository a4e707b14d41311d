//! Local decoding of identity-provider tokens.
//!
//! This reads the claims of a JWT without checking its signature. It exists
//! only for the offline login path; sessions built from it are marked
//! unverified.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::errors::ClientError;
use crate::models::{Session, UserProfile};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Decodes the payload segment of `credential`.
pub fn decode_claims(credential: &str) -> Result<IdTokenClaims, ClientError> {
    let payload = credential
        .trim()
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ClientError::Token("credential has no payload segment".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::Token(format!("payload is not base64url: {e}")))?;

    let claims: IdTokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::Token(format!("payload is not a claims object: {e}")))?;

    if claims.sub.trim().is_empty() {
        return Err(ClientError::Token("claims carry an empty subject".to_string()));
    }
    Ok(claims)
}

impl From<IdTokenClaims> for Session {
    fn from(claims: IdTokenClaims) -> Self {
        Session {
            user: UserProfile {
                id: claims.sub,
                name: claims.name,
                email: claims.email,
                picture: claims.picture,
            },
            existing_resume: None,
            verified: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds an unsigned token with the given JSON payload.
    pub(crate) fn fake_jwt(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_claims_reads_profile() {
        let token = fake_jwt(
            r#"{"sub":"1094","name":"Priya","email":"p@example.com","picture":"https://img/p.png","iss":"accounts.google.com"}"#,
        );
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "1094");
        assert_eq!(claims.name.as_deref(), Some("Priya"));
        assert_eq!(claims.picture.as_deref(), Some("https://img/p.png"));
    }

    #[test]
    fn test_decode_claims_tolerates_padding() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"7"}"#);
        let token = format!("{header}.{body}.sig");
        assert_eq!(decode_claims(&token).unwrap().sub, "7");
    }

    #[test]
    fn test_decode_claims_rejects_garbage() {
        assert!(matches!(decode_claims("not-a-jwt"), Err(ClientError::Token(_))));
        assert!(matches!(decode_claims("a.!!!.c"), Err(ClientError::Token(_))));
        assert!(matches!(decode_claims(""), Err(ClientError::Token(_))));
    }

    #[test]
    fn test_decode_claims_requires_subject() {
        let token = fake_jwt(r#"{"name":"No Sub"}"#);
        assert!(decode_claims(&token).is_err());
        let token = fake_jwt(r#"{"sub":""}"#);
        assert!(decode_claims(&token).is_err());
    }

    #[test]
    fn test_session_from_claims_is_unverified() {
        let claims = decode_claims(&fake_jwt(r#"{"sub":"5","name":"Sam"}"#)).unwrap();
        let session = Session::from(claims);
        assert!(!session.verified);
        assert_eq!(session.user.id, "5");
        assert!(session.existing_resume.is_none());
    }
}
