//! Capability-based API authorization.
//!
//! Callers present a static shared secret in the `Authorization` header. The
//! [`CredentialRegistry`] resolves it to a [`Role`], the [`PermissionPolicy`]
//! decides whether that role may invoke the requested [`Operation`], and the
//! [`Permit`] request guard ties the two together in front of every route.

mod guard;
mod permissions;
mod registry;
mod role;

pub use guard::{endpoint, AuthError, AuthResult, Authorizer, Endpoint, Permit, AUTHORIZATION};
pub use permissions::{Operation, PermissionMatrix, PermissionPolicy, UnknownOperation};
pub use registry::{extract_token, CredentialRegistry, RegistryError, Secret};
pub use role::{Role, UnknownRole};
