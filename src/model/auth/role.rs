use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed categories of API caller. Each is identified by exactly one
/// shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A polling station terminal.
    Station,
    /// A polling booth.
    Booth,
    /// A voter-facing device.
    Voter,
    /// The results server.
    Results,
    /// A PIN-issuance kiosk.
    Pins,
    /// An outcome viewer.
    Outcome,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Station,
        Role::Booth,
        Role::Voter,
        Role::Results,
        Role::Pins,
        Role::Outcome,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Station => "station",
            Self::Booth => "booth",
            Self::Voter => "voter",
            Self::Results => "results",
            Self::Pins => "pins",
            Self::Outcome => "outcome",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
