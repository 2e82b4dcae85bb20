//! Token issuance and decoding

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, TokenError};
use crate::identity::Identity;
use crate::key::SigningKey;

const ROLE_DELIMITER: &str = ",";
const ALGORITHM: Algorithm = Algorithm::HS512;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Roles joined by `,`
    #[serde(rename = "auth")]
    pub authorities: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    fn new(identity: &Identity, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        let authorities = identity
            .roles()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(ROLE_DELIMITER);

        Self {
            sub: identity.subject().to_string(),
            authorities,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Rebuild the identity; an empty role claim yields no roles
    pub fn to_identity(&self) -> Identity {
        let roles = self
            .authorities
            .split(ROLE_DELIMITER)
            .filter(|role| !role.is_empty());
        Identity::new(self.sub.clone(), roles)
    }
}

/// Issues and decodes HS512-signed tokens
#[derive(Clone)]
pub struct TokenCodec {
    key: SigningKey,
    validity: Duration,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec; `validity` is the lifetime used by [`TokenCodec::issue`]
    pub fn new(key: SigningKey, validity: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiration is checked against the caller's clock in `decode_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key,
            validity,
            validation,
        }
    }

    /// Configured token lifetime
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token with the configured lifetime
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_for(identity, self.validity)
    }

    /// Issue a token valid for `validity` from now
    pub fn issue_for(&self, identity: &Identity, validity: Duration) -> Result<String, AuthError> {
        self.issue_at(identity, validity, Utc::now())
    }

    /// Issue a token as of `issued_at`
    pub fn issue_at(
        &self,
        identity: &Identity,
        validity: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if validity <= Duration::zero() {
            return Err(AuthError::InvalidValidity);
        }
        let expires_at = issued_at
            .checked_add_signed(validity)
            .ok_or(AuthError::InvalidValidity)?;

        // Such names would not survive the comma-joined claim.
        if let Some(role) = identity
            .roles()
            .iter()
            .find(|role| role.is_empty() || role.contains(ROLE_DELIMITER))
        {
            return Err(AuthError::InvalidRole(role.clone()));
        }

        let claims = Claims::new(identity, issued_at, expires_at);

        debug!("Issuing token for subject: {}", identity.subject());

        let token = encode(&Header::new(ALGORITHM), &claims, self.key.encoding_key())?;
        metrics::counter!("warden_tokens_issued_total").increment(1);
        Ok(token)
    }

    /// Verify a token and return the identity it carries
    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify a token against the clock value `now`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        self.decode_claims(token, now)
            .map(|claims| claims.to_identity())
            .inspect_err(|err| {
                debug!(reason = err.as_str(), "Token rejected");
                metrics::counter!("warden_token_rejections_total", "reason" => err.as_str())
                    .increment(1);
            })
    }

    /// Yes/no form of [`TokenCodec::decode`]
    pub fn validate(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    fn decode_claims(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        // Everything after the second dot belongs to the signature.
        let segments: Vec<&str> = token.splitn(3, '.').collect();
        let [header, _, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed);
        };

        check_header(header)?;

        // An undecodable signature can never verify.
        if URL_SAFE_NO_PAD.decode(signature).is_err() {
            return Err(TokenError::InvalidSignature);
        }

        let data = decode::<Claims>(token, self.key.decoding_key(), &self.validation)
            .map_err(|e| classify(e.kind()))?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

/// Only `HS512` tokens with no type or type `JWT` are accepted
fn check_header(segment: &str) -> Result<(), TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    let header: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .ok_or(TokenError::Malformed)?;
    if alg != "HS512" {
        return Err(TokenError::UnsupportedType);
    }

    match header.get("typ") {
        None | Some(serde_json::Value::Null) => Ok(()),
        Some(typ) if typ.as_str().is_some_and(|t| t.eq_ignore_ascii_case("JWT")) => Ok(()),
        Some(_) => Err(TokenError::UnsupportedType),
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::UnsupportedType
        }
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jsonwebtoken::EncodingKey;

    const KEY_BYTES: [u8; 64] = [0x5a; 64];

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKey::from_bytes(&KEY_BYTES).unwrap(), Duration::hours(24))
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn payload_json(token: &str) -> serde_json::Value {
        let payload = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_then_decode_returns_identity() {
        let codec = codec();
        let bob = Identity::new("bob", ["ROLE_USER"]);

        let token = codec.issue_for(&bob, Duration::seconds(3600)).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), bob);
        assert!(codec.validate(&token));
    }

    #[test]
    fn test_round_trip_with_several_roles() {
        let codec = codec();
        let alice = Identity::new("alice", ["ROLE_USER", "ROLE_ADMIN"]);

        let token = codec.issue(&alice).unwrap();
        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded, alice);
        assert!(decoded.has_role("ROLE_ADMIN"));
    }

    #[test]
    fn test_empty_roles_decode_to_empty_set() {
        let codec = codec();
        let carol = Identity::new("carol", Vec::<String>::new());

        let token = codec.issue_for(&carol, Duration::seconds(60)).unwrap();
        assert_eq!(payload_json(&token)["auth"], "");

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.subject(), "carol");
        assert!(decoded.roles().is_empty());
    }

    #[test]
    fn test_wire_claims() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER", "ROLE_ADMIN"]);
        let token = codec
            .issue_at(&identity, Duration::seconds(3600), issued_at())
            .unwrap();

        assert_eq!(token.split('.').count(), 3);
        let claims = payload_json(&token);
        assert_eq!(claims["sub"], "bob");
        assert_eq!(claims["auth"], "ROLE_ADMIN,ROLE_USER");
        assert_eq!(claims["exp"], issued_at().timestamp() + 3600);
        assert_eq!(claims["iat"], issued_at().timestamp());

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn test_issue_is_deterministic_for_same_timestamp() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER"]);
        let a = codec.issue_at(&identity, Duration::seconds(60), issued_at()).unwrap();
        let b = codec.issue_at(&identity, Duration::seconds(60), issued_at()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_positive_validity_rejected() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER"]);
        assert!(matches!(
            codec.issue_for(&identity, Duration::zero()),
            Err(AuthError::InvalidValidity)
        ));
    }

    #[test]
    fn test_expired_after_validity_elapses() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER"]);
        let token = codec
            .issue_at(&identity, Duration::seconds(60), issued_at())
            .unwrap();

        let before = issued_at() + Duration::seconds(59);
        assert_eq!(codec.decode_at(&token, before).unwrap(), identity);

        let after = issued_at() + Duration::seconds(61);
        assert_eq!(codec.decode_at(&token, after), Err(TokenError::Expired));
    }

    #[test]
    fn test_any_signature_byte_change_is_invalid_signature() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER"]);
        let token = codec.issue(&identity).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for i in sig_start..token.len() {
            for replacement in [b'A', b'B', b'.', b'!', b'~'] {
                let mut bytes = token.clone().into_bytes();
                if bytes[i] == replacement {
                    continue;
                }
                bytes[i] = replacement;
                let tampered = String::from_utf8(bytes).unwrap();

                assert_eq!(
                    codec.decode(&tampered),
                    Err(TokenError::InvalidSignature),
                    "byte {} of signature replaced with {:?}",
                    i - sig_start,
                    replacement as char
                );
            }
        }
    }

    #[test]
    fn test_extra_segment_is_invalid_signature() {
        let codec = codec();
        let token = codec.issue(&Identity::new("bob", ["ROLE_USER"])).unwrap();

        assert_eq!(
            codec.decode(&format!("{}.AAAA", token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_roles_that_cannot_be_joined_are_rejected() {
        let codec = codec();

        let joined = Identity::new("dave", ["ROLE_A,ROLE_B"]);
        assert!(matches!(
            codec.issue(&joined),
            Err(AuthError::InvalidRole(role)) if role == "ROLE_A,ROLE_B"
        ));

        let empty = Identity::new("erin", ["ROLE_USER", ""]);
        assert!(matches!(
            codec.issue(&empty),
            Err(AuthError::InvalidRole(role)) if role.is_empty()
        ));
    }

    #[test]
    fn test_validity_past_calendar_range_is_rejected() {
        let codec = codec();
        let identity = Identity::new("bob", ["ROLE_USER"]);

        assert!(matches!(
            codec.issue_for(&identity, Duration::seconds(9_000_000_000_000)),
            Err(AuthError::InvalidValidity)
        ));
    }

    #[test]
    fn test_token_from_other_key_is_invalid_signature() {
        let other = TokenCodec::new(SigningKey::from_bytes(&[0x11; 64]).unwrap(), Duration::hours(1));
        let token = other.issue(&Identity::new("mallory", ["ROLE_ADMIN"])).unwrap();

        assert_eq!(codec().decode(&token), Err(TokenError::InvalidSignature));
        assert!(!codec().validate(&token));
    }

    #[test]
    fn test_other_algorithm_is_unsupported() {
        let claims = Claims::new(
            &Identity::new("bob", ["ROLE_USER"]),
            Utc::now(),
            Utc::now() + Duration::hours(1),
        );
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&KEY_BYTES),
        )
        .unwrap();

        assert_eq!(codec().decode(&token), Err(TokenError::UnsupportedType));
    }

    #[test]
    fn test_unsigned_token_is_unsupported() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"bob","auth":"ROLE_ADMIN","exp":9999999999}"#);
        let token = format!("{}.{}.", header, payload);

        assert_eq!(codec().decode(&token), Err(TokenError::UnsupportedType));
    }

    #[test]
    fn test_foreign_type_is_unsupported() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512","typ":"at+jwt"}"#);
        let token = format!("{}.e30.AAAA", header);

        assert_eq!(codec().decode(&token), Err(TokenError::UnsupportedType));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
        assert_eq!(codec.decode("invalid-token"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("a.b"), Err(TokenError::Malformed));
        assert_eq!(codec.decode("!!!.e30.AAAA"), Err(TokenError::Malformed));
        assert!(!codec.validate("invalid-token"));
    }

    #[test]
    fn test_missing_authorities_claim_is_malformed() {
        #[derive(Serialize)]
        struct NoRoles {
            sub: String,
            exp: i64,
        }

        let claims = NoRoles {
            sub: "bob".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(&KEY_BYTES),
        )
        .unwrap();

        assert_eq!(codec().decode(&token), Err(TokenError::Malformed));
    }
}
