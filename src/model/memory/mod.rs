//! An in-process [`ElectionStore`], for demos and tests.

mod snapshot;
#[cfg(test)]
pub use snapshot::examples;
pub use snapshot::{Snapshot, SnapshotError};

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rocket::http::Status;

use crate::error::{Error, Result};
use crate::model::{
    election::{
        Candidate, CandidateId, Constituency, ConstituencyId, IssuedPin, Party, Station,
        StationId, Voter, VoterFlag, VoterId,
    },
    store::ElectionStore,
};

use snapshot::Tables;

/// Election data held behind a lock. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<RwLock<Tables>>);

impl MemoryStore {
    /// Build a store from a snapshot, checking every cross-reference.
    pub fn from_snapshot(snapshot: Snapshot) -> std::result::Result<Self, SnapshotError> {
        let tables = Tables::try_from(snapshot)?;
        Ok(Self(Arc::new(RwLock::new(tables))))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.0
            .read()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.0
            .write()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".to_string()))
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn get_voter_by_id(&self, id: VoterId) -> Result<Option<Voter>> {
        Ok(self.read()?.voters.get(&id).cloned())
    }

    async fn find_voters(
        &self,
        station_id: StationId,
        name_pattern: &str,
        postcode: &str,
    ) -> Result<Vec<Voter>> {
        let pattern = name_pattern.to_lowercase();
        let postcode = postcode.to_lowercase();
        Ok(self
            .read()?
            .voters
            .values()
            .filter(|voter| voter.station_id == station_id)
            .filter(|voter| voter.first_name.to_lowercase().contains(&pattern))
            .filter(|voter| voter.postcode.to_lowercase() == postcode)
            .cloned()
            .collect())
    }

    async fn save_voter(&self, voter: &Voter) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.stations.contains_key(&voter.station_id) {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                format!(
                    "Voter {} references unknown station {}",
                    voter.id, voter.station_id
                ),
            ));
        }
        tables.voters.insert(voter.id, voter.clone());
        Ok(())
    }

    async fn set_voter_flag(&self, id: VoterId, flag: VoterFlag) -> Result<bool> {
        Ok(match self.write()?.voters.get_mut(&id) {
            Some(voter) => {
                voter.raise(flag);
                true
            }
            None => false,
        })
    }

    async fn mark_vote_cast(&self, id: VoterId) -> Result<bool> {
        Ok(match self.write()?.voters.get_mut(&id) {
            Some(voter) if !voter.used_vote => {
                voter.used_vote = true;
                true
            }
            _ => false,
        })
    }

    async fn get_station_by_id(&self, id: StationId) -> Result<Option<Station>> {
        Ok(self.read()?.stations.get(&id).cloned())
    }

    async fn find_candidates_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Candidate>> {
        Ok(self
            .read()?
            .candidates
            .values()
            .filter(|candidate| candidate.constituency_id == id)
            .cloned()
            .collect())
    }

    async fn get_candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.read()?.candidates.get(&id).cloned())
    }

    async fn record_vote(&self, id: CandidateId) -> Result<bool> {
        Ok(match self.write()?.candidates.get_mut(&id) {
            Some(candidate) => {
                candidate.votes = candidate.votes.checked_add(1).ok_or_else(|| {
                    Error::StoreUnavailable(format!("tally of candidate {id} is full"))
                })?;
                true
            }
            None => false,
        })
    }

    async fn list_constituencies(&self) -> Result<Vec<Constituency>> {
        Ok(self.read()?.constituencies.values().cloned().collect())
    }

    async fn list_stations_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Station>> {
        Ok(self
            .read()?
            .stations
            .values()
            .filter(|station| station.constituency_id == id)
            .cloned()
            .collect())
    }

    async fn count_voters_by_station(&self, id: StationId) -> Result<u64> {
        let tables = self.read()?;
        let count = tables.voters.values().filter(|v| v.station_id == id).count();
        Ok(count as u64)
    }

    async fn count_used_votes_by_station(&self, id: StationId) -> Result<u64> {
        let tables = self.read()?;
        let count = tables
            .voters
            .values()
            .filter(|v| v.station_id == id && v.used_vote)
            .count();
        Ok(count as u64)
    }

    async fn list_parties(&self) -> Result<Vec<Party>> {
        Ok(self.read()?.parties.values().cloned().collect())
    }

    async fn issue_pin(&self, pin: &IssuedPin) -> Result<bool> {
        let mut tables = self.write()?;
        let taken = tables
            .pins
            .values()
            .any(|other| other.code == pin.code && other.voter_id != pin.voter_id);
        if taken {
            return Ok(false);
        }
        tables.pins.insert(pin.voter_id, pin.clone());
        Ok(true)
    }

    async fn find_pin(&self, code: &str) -> Result<Option<IssuedPin>> {
        Ok(self
            .read()?
            .pins
            .values()
            .find(|pin| pin.code == code)
            .cloned())
    }

    async fn retire_pin(&self, code: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let voter_id = tables
            .pins
            .values()
            .find(|pin| pin.code == code)
            .map(|pin| pin.voter_id);
        Ok(voter_id
            .and_then(|voter_id| tables.pins.remove(&voter_id))
            .is_some())
    }
}


#[cfg(test)]
mod tests {
    use super::examples::*;
    use super::*;
    use crate::model::store::{behaviour, Store};

    fn store() -> Store {
        Store::new(MemoryStore::example())
    }

    #[rocket::async_test]
    async fn finds_voters_ignoring_case() {
        behaviour::finds_voters_ignoring_case(&store()).await;
    }

    #[rocket::async_test]
    async fn flags_are_independent_and_monotonic() {
        behaviour::flags_are_independent_and_monotonic(&store()).await;
    }

    #[rocket::async_test]
    async fn vote_is_cast_once() {
        behaviour::vote_is_cast_once(&store()).await;
    }

    #[rocket::async_test]
    async fn concurrent_flag_updates_are_not_lost() {
        behaviour::concurrent_flag_updates_are_not_lost(&store()).await;
    }

    #[rocket::async_test]
    async fn concurrent_votes_are_cast_once() {
        behaviour::concurrent_votes_are_cast_once(&store()).await;
    }

    #[rocket::async_test]
    async fn save_voter_requires_a_station() {
        behaviour::save_voter_requires_a_station(&store()).await;
    }

    #[rocket::async_test]
    async fn candidates_and_tallies() {
        behaviour::candidates_and_tallies(&store()).await;
    }

    #[rocket::async_test]
    async fn counts_by_station() {
        behaviour::counts_by_station(&store()).await;
    }

    #[rocket::async_test]
    async fn listings_are_ordered_by_id() {
        behaviour::listings_are_ordered_by_id(&store()).await;
    }

    #[rocket::async_test]
    async fn pins_are_unique_per_voter_and_code() {
        behaviour::pins_are_unique_per_voter_and_code(&store()).await;
    }

    #[rocket::async_test]
    async fn full_tally_is_an_error() {
        let mut snapshot = Snapshot::example();
        for candidate in &mut snapshot.candidates {
            candidate.votes = u32::MAX;
        }
        let store = MemoryStore::from_snapshot(snapshot).unwrap();

        assert!(matches!(
            store.record_vote(BOND_CANDIDATE).await,
            Err(Error::StoreUnavailable(_))
        ));
        let candidate = store.get_candidate_by_id(BOND_CANDIDATE).await.unwrap().unwrap();
        assert_eq!(candidate.votes, u32::MAX);
    }

    #[test]
    fn invalid_snapshots_are_rejected() {
        let mut snapshot = Snapshot::example();
        snapshot.voters[0].station_id = MISSING_STATION;
        assert_eq!(
            MemoryStore::from_snapshot(snapshot.clone()).unwrap_err(),
            SnapshotError::VoterStation(ELIGIBLE_VOTER, MISSING_STATION)
        );
        assert!(snapshot.validate().is_err());
        assert_eq!(Snapshot::example().validate(), Ok(()));
    }
}
