use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::election::{
    Candidate, CandidateId, ConstituencyId, PartyId, StationId, Voter, VoterId,
};

/// Result of `check_votable`. `used_vote` is `null` when the voter does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotableStatus {
    pub voter_exists: bool,
    pub used_vote: Option<bool>,
}

impl From<Option<&Voter>> for VotableStatus {
    fn from(voter: Option<&Voter>) -> Self {
        Self {
            voter_exists: voter.is_some(),
            used_vote: voter.map(|voter| voter.used_vote),
        }
    }
}

/// Outcome of a mutation that may find nothing to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

impl From<bool> for Success {
    fn from(success: bool) -> Self {
        Self { success }
    }
}

/// API representation of a voter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDesc {
    pub id: VoterId,
    pub first_name: String,
    pub last_name: String,
    pub addr_line_1: String,
    pub addr_line_2: Option<String>,
    pub postcode: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub station_id: StationId,
    pub used_vote: bool,
    pub active_pin: bool,
}

impl From<Voter> for VoterDesc {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            first_name: voter.first_name,
            last_name: voter.last_name,
            addr_line_1: voter.addr_line_1,
            addr_line_2: voter.addr_line_2,
            postcode: voter.postcode,
            date_of_birth: voter.date_of_birth,
            phone: voter.phone,
            station_id: voter.station_id,
            used_vote: voter.used_vote,
            active_pin: voter.active_pin,
        }
    }
}

/// Result of `get_voters`. `success` is true iff at least one voter matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterMatches {
    pub success: bool,
    pub voters: Vec<VoterDesc>,
}

impl From<Vec<Voter>> for VoterMatches {
    fn from(voters: Vec<Voter>) -> Self {
        Self {
            success: !voters.is_empty(),
            voters: voters.into_iter().map(VoterDesc::from).collect(),
        }
    }
}

/// API representation of a candidate, without their tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDesc {
    pub id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub constituency_id: ConstituencyId,
    pub party_id: PartyId,
}

impl From<Candidate> for CandidateDesc {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            constituency_id: candidate.constituency_id,
            party_id: candidate.party_id,
        }
    }
}

/// Result of `get_candidates`. `success` is true iff the list is non-empty,
/// so an unknown station and a station with no candidates look the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatches {
    pub success: bool,
    pub candidates: Vec<CandidateDesc>,
}

impl From<Vec<Candidate>> for CandidateMatches {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self {
            success: !candidates.is_empty(),
            candidates: candidates.into_iter().map(CandidateDesc::from).collect(),
        }
    }
}

/// One row of the turnout report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoutEntry {
    pub constituency_id: ConstituencyId,
    pub constituency_name: String,
    pub voted: u64,
    pub registered: u64,
}

/// Result of `get_pin_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinIssued {
    pub success: bool,
    pub pin_code: Option<String>,
}

/// Result of `verify_and_check_eligibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinEligibility {
    pub pin_valid: bool,
    pub used_vote: Option<bool>,
}

/// A candidate's tally within [`ConstituencyResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub party_name: Option<String>,
    pub votes: u32,
}

/// Per-constituency ballot tallies, highest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyResult {
    pub constituency_id: ConstituencyId,
    pub constituency_name: String,
    pub candidates: Vec<CandidateTally>,
}
