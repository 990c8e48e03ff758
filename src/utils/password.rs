//! Password hashing
//!
//! PBKDF2-HMAC-SHA256 stored as `pbkdf2_sha256$<rounds>$<salt>$<hash>`
//! with URL-safe base64 for salt and hash. The round count travels
//! with the hash, so lowering it for tests never breaks verification.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::utils::constants::{PASSWORD_HASH_LEN, PASSWORD_SALT_LEN};

const SCHEME: &str = "pbkdf2_sha256";

/// Hash `password` with a fresh random salt
pub fn hash_password(password: &str, rounds: u32) -> String {
    let mut salt = [0u8; PASSWORD_SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; PASSWORD_HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut hash);

    format!(
        "{}${}${}${}",
        SCHEME,
        rounds,
        URL_SAFE.encode(salt),
        URL_SAFE.encode(hash)
    )
}

/// Check `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (URL_SAFE.decode(salt), URL_SAFE.decode(expected)) else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut actual);
    constant_time_eq(&actual, &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
