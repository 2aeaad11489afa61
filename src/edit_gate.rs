//! Password gate in front of the board's mutation controls.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGateError {
    #[error("Password required")]
    PasswordRequired,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Edit mode is disabled")]
    Disabled,
}

/// The configured edit password, kept only as an argon2 hash.
pub struct EditSecret {
    hash: String,
}

impl EditSecret {
    pub fn new(plain: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|err| anyhow!("Failed to hash edit password: {}", err))?
            .to_string();
        Ok(Self { hash })
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(hash) => Argon2::default()
                .verify_password(candidate.as_bytes(), &hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for EditSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EditSecret(..)")
    }
}

/// Per-session edit mode. Once the password was accepted, later toggles in
/// the same session need no password.
#[derive(Debug)]
pub struct EditModeGate {
    secret: Option<Arc<EditSecret>>,
    authorized: bool,
    edit_mode: bool,
}

impl EditModeGate {
    pub fn new(secret: Option<Arc<EditSecret>>) -> Self {
        Self {
            secret,
            authorized: false,
            edit_mode: false,
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Flips edit mode and returns the new mode.
    pub fn toggle(&mut self, password: Option<&str>) -> Result<bool, EditGateError> {
        if self.edit_mode {
            self.edit_mode = false;
            return Ok(false);
        }
        if self.authorized {
            self.edit_mode = true;
            return Ok(true);
        }

        let secret = self.secret.as_ref().ok_or(EditGateError::Disabled)?;
        let password = password.ok_or(EditGateError::PasswordRequired)?;
        if !secret.verify(password) {
            debug!("Rejected edit mode password");
            return Err(EditGateError::WrongPassword);
        }

        info!("Edit mode unlocked for session");
        self.authorized = true;
        self.edit_mode = true;
        Ok(true)
    }
}
