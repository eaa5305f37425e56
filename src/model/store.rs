//! The data store collaborator consumed by the API handlers.

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::election::{
    Candidate, CandidateId, Constituency, ConstituencyId, IssuedPin, Party, Station,
    StationId, Voter, VoterFlag, VoterId,
};

/// Storage for polling-day data.
///
/// Every method reflects current state; implementations must not cache.
/// Single-record updates must be atomic, but no method spans records
/// transactionally.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    async fn get_voter_by_id(&self, id: VoterId) -> Result<Option<Voter>>;

    /// Voters at `station_id` whose first name contains `name_pattern` and
    /// whose postcode equals `postcode`, both ignoring case.
    async fn find_voters(
        &self,
        station_id: StationId,
        name_pattern: &str,
        postcode: &str,
    ) -> Result<Vec<Voter>>;

    /// Insert or replace a whole voter record.
    async fn save_voter(&self, voter: &Voter) -> Result<()>;

    /// Set a single flag on a voter. Returns false if the voter does not exist.
    async fn set_voter_flag(&self, id: VoterId, flag: VoterFlag) -> Result<bool>;

    /// Mark a vote as used only if it was unused. Returns whether this call
    /// made the transition.
    async fn mark_vote_cast(&self, id: VoterId) -> Result<bool>;

    async fn get_station_by_id(&self, id: StationId) -> Result<Option<Station>>;

    async fn find_candidates_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Candidate>>;

    async fn get_candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>>;

    /// Add one ballot to a candidate's tally. Returns false if the candidate
    /// does not exist.
    async fn record_vote(&self, id: CandidateId) -> Result<bool>;

    async fn list_constituencies(&self) -> Result<Vec<Constituency>>;

    async fn list_stations_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Station>>;

    async fn count_voters_by_station(&self, id: StationId) -> Result<u64>;

    async fn count_used_votes_by_station(&self, id: StationId) -> Result<u64>;

    async fn list_parties(&self) -> Result<Vec<Party>>;

    /// Store a PIN, replacing any earlier PIN of the same voter. Returns false
    /// (storing nothing) if another voter already holds the code.
    async fn issue_pin(&self, pin: &IssuedPin) -> Result<bool>;

    async fn find_pin(&self, code: &str) -> Result<Option<IssuedPin>>;

    /// Remove a PIN. Returns false if no such PIN existed.
    async fn retire_pin(&self, code: &str) -> Result<bool>;
}

/// A shared handle on whichever store the server was configured with.
#[derive(Clone)]
pub struct Store(Arc<dyn ElectionStore>);

impl Store {
    pub fn new(store: impl ElectionStore + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Store {
    type Target = dyn ElectionStore;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.guard::<&State<Store>>().await {
            request::Outcome::Success(store) => request::Outcome::Success(Store::clone(store)),
            _ => {
                error!("No store is managed");
                request::Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
