use anyhow::Result;
use chrono::{Duration, Utc};
use common::Role;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure shared with the account service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub role: Role,
    pub exp: usize, // Expiration timestamp
}

/// Sign a token for a user. The account service owns issuance in production;
/// this exists for local tooling and tests.
pub fn sign(user_id: i32, username: &str, role: Role, secret: &[u8]) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        role,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(token)
}

/// Verify and decode a token.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let secret = b"test_secret";
        let token = sign(7, "alice", Role::Staff, secret).unwrap();
        let claims = verify(&token, secret).unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Staff);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(7, "alice", Role::Member, b"secret_a").unwrap();
        assert!(verify(&token, b"secret_b").is_err());
    }
}
