use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::validation::{ErrorCode, ValidationErrors};

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("invalid password hash cost {0}: {1}")]
    InvalidCost(u32, argon2::Error),

    #[error("password hashing failed: {0}")]
    HashFailed(argon2::password_hash::Error),

    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn hasher(cost: u32) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        cost,
        Params::DEFAULT_P_COST,
        None,
    )
    .map_err(|err| PasswordError::InvalidCost(cost, err))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// One-way salted hash in PHC string format. `cost` is the number of
/// passes over memory; the hash records it, so verification needs no cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher(cost)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::HashFailed)?;

    Ok(hash.to_string())
}

/// False for a wrong password and for a malformed stored hash.
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn verify_password(submitted_password: &str, stored_hash: &str) -> ValidationErrors {
    if password_matches(submitted_password, stored_hash) {
        ValidationErrors::new()
    } else {
        ErrorCode::OldPasswordIncorrect.into()
    }
}

pub fn verify_new_password(new_password: &str, current_hash: &str) -> ValidationErrors {
    if password_matches(new_password, current_hash) {
        ErrorCode::PasswordSameAsOld.into()
    } else {
        ValidationErrors::new()
    }
}
