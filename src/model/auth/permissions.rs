use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use super::Role;

/// A named API capability, gated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CheckVotable,
    GetVoters,
    MakeVoterIneligible,
    SetVoterHasActivePin,
    GetCandidates,
    GetPinCode,
    VerifyAndCheckEligibility,
    VerifyAndMakeIneligible,
    CastVote,
    TurnoutReport,
    ConstituencyResults,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::CheckVotable,
        Operation::GetVoters,
        Operation::MakeVoterIneligible,
        Operation::SetVoterHasActivePin,
        Operation::GetCandidates,
        Operation::GetPinCode,
        Operation::VerifyAndCheckEligibility,
        Operation::VerifyAndMakeIneligible,
        Operation::CastVote,
        Operation::TurnoutReport,
        Operation::ConstituencyResults,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CheckVotable => "check_votable",
            Self::GetVoters => "get_voters",
            Self::MakeVoterIneligible => "make_voter_ineligible",
            Self::SetVoterHasActivePin => "set_voter_has_active_pin",
            Self::GetCandidates => "get_candidates",
            Self::GetPinCode => "get_pin_code",
            Self::VerifyAndCheckEligibility => "verify_and_check_eligibility",
            Self::VerifyAndMakeIneligible => "verify_and_make_ineligible",
            Self::CastVote => "cast_vote",
            Self::TurnoutReport => "turnout_report",
            Self::ConstituencyResults => "constituency_results",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Decides which roles may invoke which operations.
pub trait PermissionPolicy: Send + Sync {
    fn is_authorized(&self, role: Role, operation: Operation) -> bool;

    /// Check an operation given by name. Names that do not parse are never
    /// authorized.
    fn is_authorized_by_name(&self, role: Role, operation: &str) -> bool {
        operation
            .parse::<Operation>()
            .map_or(false, |operation| self.is_authorized(role, operation))
    }
}

/// The static polling-day permission table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// The roles allowed to perform `operation`.
    pub fn allowed_roles(operation: Operation) -> &'static [Role] {
        use Role::*;

        match operation {
            Operation::CheckVotable => &[Pins, Booth],
            Operation::GetVoters => &[Station],
            Operation::MakeVoterIneligible => &[Pins],
            Operation::SetVoterHasActivePin => &[Pins],
            Operation::GetCandidates => &[Booth],
            Operation::GetPinCode => &[Station],
            Operation::VerifyAndCheckEligibility => &[Results, Booth],
            Operation::VerifyAndMakeIneligible => &[Results],
            Operation::CastVote => &[Booth],
            Operation::TurnoutReport => &[Outcome],
            Operation::ConstituencyResults => &[Outcome],
        }
    }
}

impl PermissionPolicy for PermissionMatrix {
    fn is_authorized(&self, role: Role, operation: Operation) -> bool {
        Self::allowed_roles(operation).contains(&role)
    }
}
