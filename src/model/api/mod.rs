//! Request parameters and response bodies of the HTTP API.

mod params;
mod responses;

pub use params::{ParamError, PinCode, Postcode, VoterName, MAX_PIN_LENGTH};
pub use responses::{
    CandidateDesc, CandidateMatches, CandidateTally, ConstituencyResult, PinEligibility,
    PinIssued, Success, TurnoutEntry, VotableStatus, VoterDesc, VoterMatches,
};
