//! Election entities as held by the data store.
//!
//! Every entity carries an integer `_id` assigned at provisioning time.
//! References between entities are plain ids; the store never cascades a
//! delete from one entity to another.

mod candidate;
mod constituency;
mod party;
mod pin;
mod station;
mod voter;

pub use candidate::{Candidate, CandidateId};
pub use constituency::{Constituency, ConstituencyId};
pub use party::{Party, PartyId};
pub use pin::IssuedPin;
pub use station::{Station, StationId};
pub use voter::{Voter, VoterFlag, VoterId};
