use std::fmt::{Debug, Formatter};

use serde::Deserialize;
use thiserror::Error;

use super::Role;

/// An opaque shared secret. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn matches(&self, token: &str) -> bool {
        self.0.as_bytes() == token.as_bytes()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No secret configured for role `{0}`")]
    Missing(Role),
    #[error("Empty secret configured for role `{0}`")]
    Empty(Role),
    #[error("Roles `{0}` and `{1}` share the same secret")]
    Duplicate(Role, Role),
}

/// Immutable mapping from each role to its secret, built once at launch.
#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    entries: Vec<(Role, Secret)>,
}

impl CredentialRegistry {
    /// Build a registry from one secret per role.
    ///
    /// Every role must be present exactly once with a non-empty secret, and
    /// no two roles may share a secret, so that resolution is unambiguous.
    pub fn new(secrets: impl IntoIterator<Item = (Role, Secret)>) -> Result<Self, RegistryError> {
        let mut entries: Vec<(Role, Secret)> = Vec::with_capacity(Role::ALL.len());
        for (role, secret) in secrets {
            if secret.0.is_empty() {
                return Err(RegistryError::Empty(role));
            }
            if let Some((other, _)) = entries.iter().find(|(_, s)| *s == secret) {
                return Err(RegistryError::Duplicate(*other, role));
            }
            entries.retain(|(r, _)| *r != role);
            entries.push((role, secret));
        }
        if let Some(missing) = Role::ALL
            .into_iter()
            .find(|role| !entries.iter().any(|(r, _)| r == role))
        {
            return Err(RegistryError::Missing(missing));
        }
        Ok(Self { entries })
    }

    /// Resolve a presented token to the role it identifies, if any.
    pub fn resolve(&self, token: &str) -> Option<Role> {
        self.entries
            .iter()
            .find(|(_, secret)| secret.matches(token))
            .map(|(role, _)| *role)
    }
}

/// Strip an optional `<Scheme> ` prefix from an `Authorization` header value.
///
/// `Basic abc` yields `abc`; a value without a space is returned unchanged.
pub fn extract_token(header: &str) -> &str {
    let header = header.trim();
    match header.split_once(' ') {
        Some((scheme, token)) if !scheme.is_empty() => token.trim_start(),
        _ => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CredentialRegistry {
        CredentialRegistry::new(
            Role::ALL
                .into_iter()
                .map(|role| (role, Secret::new(format!("{role}-secret")))),
        )
        .unwrap()
    }

    #[test]
    fn resolves_each_role() {
        let registry = registry();
        for role in Role::ALL {
            assert_eq!(registry.resolve(&format!("{role}-secret")), Some(role));
        }
    }

    #[test]
    fn unknown_tokens_do_not_resolve() {
        let registry = registry();
        assert_eq!(registry.resolve(""), None);
        assert_eq!(registry.resolve("booth-secre"), None);
        assert_eq!(registry.resolve("booth-secret "), None);
        assert_eq!(registry.resolve("BOOTH-SECRET"), None);
    }

    #[test]
    fn rejects_bad_secret_sets() {
        let mut secrets: Vec<_> = Role::ALL
            .into_iter()
            .map(|role| (role, Secret::new(format!("{role}-secret"))))
            .collect();

        let missing = CredentialRegistry::new(secrets[1..].to_vec()).unwrap_err();
        assert_eq!(missing, RegistryError::Missing(Role::Station));

        secrets[1].1 = Secret::new("");
        let empty = CredentialRegistry::new(secrets.clone()).unwrap_err();
        assert_eq!(empty, RegistryError::Empty(Role::Booth));

        secrets[1].1 = Secret::new("station-secret");
        let duplicate = CredentialRegistry::new(secrets).unwrap_err();
        assert_eq!(duplicate, RegistryError::Duplicate(Role::Station, Role::Booth));
    }

    #[test]
    fn secrets_are_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert!(!format!("{:?}", registry()).contains("booth-secret"));
    }

    #[test]
    fn scheme_prefix_is_dropped() {
        assert_eq!(extract_token("Basic abc"), "abc");
        assert_eq!(extract_token("Bearer  abc"), "abc");
        assert_eq!(extract_token("abc"), "abc");
        assert_eq!(extract_token("  abc  "), "abc");
        assert_eq!(extract_token(""), "");
    }
}
