use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::{ConstituencyId, PartyId};

pub type CandidateId = u32;

/// A candidate standing for one party in one constituency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub constituency_id: ConstituencyId,
    pub party_id: PartyId,
    /// Ballots cast for this candidate through booths.
    #[serde(default)]
    pub votes: u32,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}
