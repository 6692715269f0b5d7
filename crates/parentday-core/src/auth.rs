//! Teacher console login.
//!
//! A single shared password from the config file gates the teacher console.
//! The session lives only as long as the process.

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::AuthError;
use crate::storage::Config;

/// Proof that the teacher password was supplied in this process.
#[derive(Debug)]
pub struct TeacherSession {
    _private: (),
}

impl TeacherSession {
    /// # Errors
    /// `NotConfigured` when no password is set, `WrongPassword` on mismatch.
    pub fn login(config: &Config, password: &str) -> Result<Self, AuthError> {
        let expected = match config.teacher.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Err(AuthError::NotConfigured),
        };
        if digest(expected) != digest(password) {
            warn!("teacher login rejected");
            return Err(AuthError::WrongPassword);
        }
        Ok(Self { _private: () })
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(password: Option<&str>) -> Config {
        let mut cfg = Config::default();
        cfg.teacher.password = password.map(str::to_string);
        cfg
    }

    #[test]
    fn correct_password_opens_session() {
        assert!(TeacherSession::login(&config_with(Some("3n-class")), "3n-class").is_ok());
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert_eq!(
            TeacherSession::login(&config_with(Some("3n-class")), "guess").unwrap_err(),
            AuthError::WrongPassword
        );
    }

    #[test]
    fn unconfigured_password_refuses_everyone() {
        for cfg in [config_with(None), config_with(Some(""))] {
            assert_eq!(
                TeacherSession::login(&cfg, "").unwrap_err(),
                AuthError::NotConfigured
            );
        }
    }
}
