//! Password hashing and session token signing

use anyhow::{bail, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How long a signed session token stays valid.
pub const SESSION_TOKEN_TTL_SECS: i64 = 60 * 60;

mod silentmoon_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum SilentmoonHasher {
    Argon2,
}

impl FromStr for SilentmoonHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(SilentmoonHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for SilentmoonHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SilentmoonHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl SilentmoonHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            SilentmoonHasher::Argon2 => silentmoon_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            SilentmoonHasher::Argon2 => silentmoon_argon2::hash(plain, b64_salt),
        }
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T) -> Result<bool> {
        match self {
            SilentmoonHasher::Argon2 => {
                silentmoon_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct SessionClaims {
    sub: usize,
    exp: i64,
}

/// Signs a session token for the given user, expiring after [SESSION_TOKEN_TTL_SECS].
pub fn issue_session_token(secret: &str, user_id: usize) -> Result<String> {
    let claims = SessionClaims {
        sub: user_id,
        exp: Utc::now().timestamp() + SESSION_TOKEN_TTL_SECS,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies a session token and returns the user id it was issued for.
/// Fails on bad signature, malformed token, or expired token alike.
pub fn verify_session_token(secret: &str, token: &str) -> Result<usize> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}
