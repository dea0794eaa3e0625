use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::TokenError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub iat: i64,     // Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Expiration time
}

/// Issues and verifies stateless HS256 tokens carrying a user id.
///
/// The signing secret is fixed at construction. Verification checks the
/// signature before any claim is read, and the MAC comparison is constant time.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: Option<i64>,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self::from_secret(config.jwt_secret.as_bytes(), config.token_ttl_secs)
    }

    pub fn from_secret(secret: &[u8], ttl_secs: Option<i64>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `verify_at` so the boundary is exact.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = match self.ttl_secs {
            Some(ttl) => Some(
                Duration::try_seconds(ttl)
                    .and_then(|ttl| issued_at.checked_add_signed(ttl))
                    .ok_or(TokenError::ExpiryOutOfRange)?
                    .timestamp(),
            ),
            None => None,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as of `now`. A token is expired from its `exp` second on.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        // Header and payload are the first two segments, the rest is signature.
        // A '.' inside the signature would make `decode` re-split the token, so
        // check the message with an empty signature instead.
        let (header, rest) = token.split_once('.').ok_or(TokenError::MalformedToken)?;
        let (payload, signature) = rest.split_once('.').ok_or(TokenError::MalformedToken)?;
        if signature.contains('.') {
            let unsigned = format!("{}.{}.", header, payload);
            decode::<Claims>(&unsigned, &self.decoding_key, &self.validation)?;
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if let Some(exp) = claims.exp {
            if now.timestamp() >= exp {
                return Err(TokenError::Expired);
            }
        }

        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::MalformedToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_TOKEN_TTL_SECS;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::TimeZone;

    fn service() -> TokenService {
        TokenService::from_secret(b"test_secret", None)
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let tokens = service();
        for _ in 0..16 {
            let user_id = Uuid::new_v4();
            let token = tokens.issue(user_id).unwrap();
            assert_eq!(tokens.verify(&token).unwrap(), user_id);
        }
    }

    #[test]
    fn test_issue_is_deterministic() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let first = tokens.issue_at(user_id, issued_at()).unwrap();
        let second = tokens.issue_at(user_id, issued_at()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_does_not_embed_secret() {
        let token = service().issue(Uuid::new_v4()).unwrap();
        assert!(!token.contains("test_secret"));
    }

    #[test]
    fn test_every_signature_bit_flip_is_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let (message, signature) = token.rsplit_once('.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!("{}.{}", message, URL_SAFE_NO_PAD.encode(&tampered));
                assert_eq!(
                    tokens.verify(&forged),
                    Err(TokenError::InvalidSignature),
                    "flipping bit {} of byte {} was accepted",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_every_bit_of_encoded_signature_is_checked() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let signature_start = token.rfind('.').unwrap() + 1;

        for index in signature_start..token.len() {
            for bit in 0..8 {
                let mut bytes = token.clone().into_bytes();
                bytes[index] ^= 1 << bit;
                let Ok(forged) = String::from_utf8(bytes) else {
                    continue;
                };
                assert_eq!(
                    tokens.verify(&forged),
                    Err(TokenError::InvalidSignature),
                    "flipping bit {} of character {} gave {:?}",
                    bit,
                    index,
                    forged
                );
            }
        }
    }

    #[test]
    fn test_dot_in_signature_is_a_bad_signature() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let (message, signature) = token.rsplit_once('.').unwrap();
        let split = format!("{}.{}.{}", message, &signature[..10], &signature[10..]);

        assert_eq!(tokens.verify(&split), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_huge_ttl_is_an_error_not_a_panic() {
        let user_id = Uuid::new_v4();
        for ttl in [9_000_000_000_000, i64::MAX] {
            let tokens = TokenService::from_secret(b"test_secret", Some(ttl));
            assert_eq!(
                tokens.issue_at(user_id, issued_at()),
                Err(TokenError::ExpiryOutOfRange)
            );
        }

        let tokens = TokenService::from_secret(b"test_secret", Some(MAX_TOKEN_TTL_SECS));
        let token = tokens.issue_at(user_id, issued_at()).unwrap();
        assert_eq!(tokens.verify_at(&token, issued_at()).unwrap(), user_id);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: 0,
            exp: None,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], payload, parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = TokenService::from_secret(b"another_secret", None)
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();
        for garbage in ["", "garbage", "a.b", "a.b.c", "Bearer", "...."] {
            assert_eq!(
                tokens.verify(garbage),
                Err(TokenError::MalformedToken),
                "accepted {:?}",
                garbage
            );
        }
    }

    #[test]
    fn test_signed_non_uuid_subject_is_malformed() {
        let claims = Claims {
            sub: "42".to_string(),
            iat: 0,
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        assert_eq!(service().verify(&token), Err(TokenError::MalformedToken));
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = TokenService::from_secret(b"test_secret", Some(60));
        let user_id = Uuid::new_v4();
        let token = tokens.issue_at(user_id, issued_at()).unwrap();

        let just_before = issued_at() + Duration::seconds(59);
        assert_eq!(tokens.verify_at(&token, just_before).unwrap(), user_id);

        let at_boundary = issued_at() + Duration::seconds(60);
        assert_eq!(tokens.verify_at(&token, at_boundary), Err(TokenError::Expired));

        let after = issued_at() + Duration::hours(1);
        assert_eq!(tokens.verify_at(&token, after), Err(TokenError::Expired));
    }

    #[test]
    fn test_no_expiry_policy() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue_at(user_id, issued_at()).unwrap();

        let far_future = issued_at() + Duration::days(3650);
        assert_eq!(tokens.verify_at(&token, far_future).unwrap(), user_id);
    }
}
