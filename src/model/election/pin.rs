use serde::{Deserialize, Serialize};

use super::VoterId;

/// A PIN issued to a voter at a station terminal. Each voter holds at most
/// one PIN, and each code belongs to at most one voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedPin {
    #[serde(rename = "_id")]
    pub voter_id: VoterId,
    pub code: String,
}

impl IssuedPin {
    pub fn new(voter_id: VoterId, code: impl Into<String>) -> Self {
        Self {
            voter_id,
            code: code.into(),
        }
    }
}
