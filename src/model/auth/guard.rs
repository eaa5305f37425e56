use std::marker::PhantomData;

use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use thiserror::Error;

use crate::logging::{CallerRole, RequestId};

use super::{extract_token, CredentialRegistry, Operation, PermissionPolicy, Role};

/// The header carrying the caller's credential.
pub const AUTHORIZATION: &str = "Authorization";

/// The decision for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    /// The credential resolved to this role, which may perform the operation.
    Allow(Role),
    /// No credential was presented.
    Unauthenticated,
    /// A credential was presented, but it is unknown or lacks permission.
    Forbidden,
}

/// Why a request was turned away by [`Permit`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credential presented")]
    MissingCredential,
    #[error("Credential does not permit `{0}`")]
    Denied(Operation),
    #[error("No authorizer configured")]
    Unconfigured,
}

/// Resolves credentials and checks them against a permission policy.
///
/// Built once at launch and shared read-only by every request.
pub struct Authorizer {
    registry: CredentialRegistry,
    policy: Box<dyn PermissionPolicy>,
}

impl Authorizer {
    pub fn new(registry: CredentialRegistry, policy: impl PermissionPolicy + 'static) -> Self {
        Self {
            registry,
            policy: Box::new(policy),
        }
    }

    /// Decide whether the raw `Authorization` header value (if any) permits
    /// `operation`.
    ///
    /// A credential that does not resolve to any role is [`AuthResult::Forbidden`],
    /// never [`AuthResult::Unauthenticated`].
    pub fn authorize(&self, credential: Option<&str>, operation: Operation) -> AuthResult {
        let Some(credential) = credential else {
            return AuthResult::Unauthenticated;
        };
        match self.registry.resolve(extract_token(credential)) {
            Some(role) if self.policy.is_authorized(role, operation) => AuthResult::Allow(role),
            _ => AuthResult::Forbidden,
        }
    }
}

/// Binds a route to the operation it implements.
pub trait Endpoint: Send + Sync + 'static {
    const OPERATION: Operation;
}

/// Declare uninhabited marker types implementing [`Endpoint`].
macro_rules! endpoints {
    ($($(#[$meta:meta])* $name:ident => $operation:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $name {}

            impl Endpoint for $name {
                const OPERATION: Operation = Operation::$operation;
            }
        )*
    };
}

/// Marker types for each gated operation, used as `Permit<endpoint::CheckVotable>`.
pub mod endpoint {
    use super::{Endpoint, Operation};

    endpoints! {
        CheckVotable => CheckVotable;
        GetVoters => GetVoters;
        MakeVoterIneligible => MakeVoterIneligible;
        SetVoterHasActivePin => SetVoterHasActivePin;
        GetCandidates => GetCandidates;
        GetPinCode => GetPinCode;
        VerifyAndCheckEligibility => VerifyAndCheckEligibility;
        VerifyAndMakeIneligible => VerifyAndMakeIneligible;
        CastVote => CastVote;
        TurnoutReport => TurnoutReport;
        ConstituencyResults => ConstituencyResults;
    }
}

/// Proof that the request's credential permits `E::OPERATION`.
///
/// Must be the first guard of a route so that nothing touches the store
/// before the check has passed.
#[derive(Debug)]
pub struct Permit<E> {
    role: Role,
    phantom: PhantomData<fn() -> E>,
}

impl<E> Permit<E> {
    /// The role the credential resolved to.
    pub fn role(&self) -> Role {
        self.role
    }
}

#[rocket::async_trait]
impl<'r, E> FromRequest<'r> for Permit<E>
where
    E: Endpoint,
{
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let id = req.local_cache(RequestId::next);
        let operation = E::OPERATION;

        let Outcome::Success(authorizer) = req.guard::<&State<Authorizer>>().await else {
            error!("req{id} rejected: no authorizer is managed");
            return Outcome::Error((Status::InternalServerError, AuthError::Unconfigured));
        };

        let credential = req.headers().get_one(AUTHORIZATION);
        match authorizer.authorize(credential, operation) {
            AuthResult::Allow(role) => {
                info!("req{id} authorized as {role} for {operation}");
                CallerRole::record(req, role);
                Outcome::Success(Permit {
                    role,
                    phantom: PhantomData,
                })
            }
            AuthResult::Unauthenticated => {
                warn!("req{id} unauthenticated for {operation}");
                Outcome::Error((Status::Unauthorized, AuthError::MissingCredential))
            }
            AuthResult::Forbidden => {
                warn!("req{id} forbidden for {operation}");
                Outcome::Error((Status::Forbidden, AuthError::Denied(operation)))
            }
        }
    }
}
