use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::CredentialScheme;

/// Secret comparison and write-side encoding, behind one seam so the
/// plaintext seed sheet and a hashed column are interchangeable without
/// touching login or change-password callers.
#[derive(Clone, Copy)]
pub struct Credentials {
    scheme: CredentialScheme,
}

impl Credentials {
    pub fn new(scheme: CredentialScheme) -> Self {
        Self { scheme }
    }

    /// Compare a candidate secret against the stored Password cell.
    pub fn verify(&self, candidate: &str, stored: &str) -> anyhow::Result<bool> {
        match self.scheme {
            CredentialScheme::Plain => Ok(candidate == stored),
            CredentialScheme::Argon2 => verify_hash(candidate, stored),
        }
    }

    /// Encode a new secret for storage under the active scheme.
    pub fn protect(&self, new_secret: &str) -> anyhow::Result<String> {
        match self.scheme {
            CredentialScheme::Plain => Ok(new_secret.to_string()),
            CredentialScheme::Argon2 => hash_secret(new_secret),
        }
    }
}

fn hash_secret(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_hash(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_scheme_is_exact_equality() {
        let creds = Credentials::new(CredentialScheme::Plain);
        assert!(creds.verify("starling", "starling").unwrap());
        assert!(!creds.verify("starling", "Starling").unwrap());
        assert!(!creds.verify("starling", "starling ").unwrap());
    }

    #[test]
    fn plain_protect_is_identity() {
        let creds = Credentials::new(CredentialScheme::Plain);
        assert_eq!(creds.protect("new-secret").unwrap(), "new-secret");
    }

    #[test]
    fn argon2_hash_and_verify_roundtrip() {
        let creds = Credentials::new(CredentialScheme::Argon2);
        let stored = creds
            .protect("Secur3P@ssw0rd!")
            .expect("hashing should succeed");
        assert_ne!(stored, "Secur3P@ssw0rd!");
        assert!(creds
            .verify("Secur3P@ssw0rd!", &stored)
            .expect("verify should succeed"));
        assert!(!creds
            .verify("wrong-password", &stored)
            .expect("verify should not error"));
    }

    #[test]
    fn argon2_errors_on_malformed_hash() {
        let creds = Credentials::new(CredentialScheme::Argon2);
        let err = creds.verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
