use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, ReplaceOptions},
    Database,
};
use rocket::{futures::TryStreamExt, http::Status};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{
    election::{
        Candidate, CandidateId, Constituency, ConstituencyId, IssuedPin, Party, Station,
        StationId, Voter, VoterFlag, VoterId,
    },
    memory::Snapshot,
    store::ElectionStore,
};

use super::{id_filter, is_duplicate_key_error, Coll};

/// An [`ElectionStore`] backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoStore {
    constituencies: Coll<Constituency>,
    stations: Coll<Station>,
    voters: Coll<Voter>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    pins: Coll<IssuedPin>,
}

impl MongoStore {
    pub fn from_db(db: &Database) -> Self {
        Self {
            constituencies: Coll::from_db(db),
            stations: Coll::from_db(db),
            voters: Coll::from_db(db),
            parties: Coll::from_db(db),
            candidates: Coll::from_db(db),
            pins: Coll::from_db(db),
        }
    }

    /// Insert every record of a snapshot, after checking its cross-references.
    ///
    /// Meant for empty collections: a record whose `_id` is already taken
    /// fails the import part-way through.
    pub async fn import(&self, snapshot: Snapshot) -> Result<()> {
        if let Err(e) = snapshot.validate() {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                format!("Invalid snapshot: {e}"),
            ));
        }
        insert_all(&self.constituencies, snapshot.constituencies).await?;
        insert_all(&self.stations, snapshot.stations).await?;
        insert_all(&self.voters, snapshot.voters).await?;
        insert_all(&self.parties, snapshot.parties).await?;
        insert_all(&self.candidates, snapshot.candidates).await?;
        insert_all(&self.pins, snapshot.pins).await?;
        Ok(())
    }
}

/// `insert_many` rejects an empty batch, so skip those.
async fn insert_all<T: Serialize>(coll: &Coll<T>, items: Vec<T>) -> Result<()> {
    if !items.is_empty() {
        coll.insert_many(items, None).await?;
    }
    Ok(())
}

fn by_id() -> FindOptions {
    FindOptions::builder().sort(doc! {"_id": 1}).build()
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

/// Filter for `find_voters`; user input is escaped so it only ever matches literally.
fn voter_filter(station_id: StationId, name_pattern: &str, postcode: &str) -> Document {
    doc! {
        "station_id": station_id,
        "first_name": {
            "$regex": regex::escape(name_pattern),
            "$options": "i",
        },
        "postcode": {
            "$regex": format!("^{}$", regex::escape(postcode)),
            "$options": "i",
        },
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn get_voter_by_id(&self, id: VoterId) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(id_filter(id), None).await?)
    }

    async fn find_voters(
        &self,
        station_id: StationId,
        name_pattern: &str,
        postcode: &str,
    ) -> Result<Vec<Voter>> {
        let filter = voter_filter(station_id, name_pattern, postcode);
        let voters = self
            .voters
            .find(filter, by_id())
            .await?
            .try_collect()
            .await?;
        Ok(voters)
    }

    async fn save_voter(&self, voter: &Voter) -> Result<()> {
        let station = self
            .stations
            .find_one(id_filter(voter.station_id), None)
            .await?;
        if station.is_none() {
            return Err(Error::Status(
                Status::UnprocessableEntity,
                format!(
                    "Voter {} references unknown station {}",
                    voter.id, voter.station_id
                ),
            ));
        }
        self.voters
            .replace_one(id_filter(voter.id), voter, upsert())
            .await?;
        Ok(())
    }

    async fn set_voter_flag(&self, id: VoterId, flag: VoterFlag) -> Result<bool> {
        let field = flag.field();
        let update = doc! {
            "$set": { field: true }
        };
        let result = self.voters.update_one(id_filter(id), update, None).await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_vote_cast(&self, id: VoterId) -> Result<bool> {
        let unused = doc! {
            "_id": id,
            "used_vote": { "$ne": true },
        };
        let field = VoterFlag::UsedVote.field();
        let update = doc! {
            "$set": { field: true }
        };
        let result = self.voters.update_one(unused, update, None).await?;
        Ok(result.modified_count > 0)
    }

    async fn get_station_by_id(&self, id: StationId) -> Result<Option<Station>> {
        Ok(self.stations.find_one(id_filter(id), None).await?)
    }

    async fn find_candidates_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Candidate>> {
        let candidates = self
            .candidates
            .find(doc! {"constituency_id": id}, by_id())
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn get_candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(id_filter(id), None).await?)
    }

    async fn record_vote(&self, id: CandidateId) -> Result<bool> {
        let update = doc! {
            "$inc": { "votes": 1 }
        };
        let result = self
            .candidates
            .update_one(id_filter(id), update, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_constituencies(&self) -> Result<Vec<Constituency>> {
        let constituencies = self
            .constituencies
            .find(None, by_id())
            .await?
            .try_collect()
            .await?;
        Ok(constituencies)
    }

    async fn list_stations_by_constituency(&self, id: ConstituencyId) -> Result<Vec<Station>> {
        let stations = self
            .stations
            .find(doc! {"constituency_id": id}, by_id())
            .await?
            .try_collect()
            .await?;
        Ok(stations)
    }

    async fn count_voters_by_station(&self, id: StationId) -> Result<u64> {
        Ok(self
            .voters
            .count_documents(doc! {"station_id": id}, None)
            .await?)
    }

    async fn count_used_votes_by_station(&self, id: StationId) -> Result<u64> {
        Ok(self
            .voters
            .count_documents(doc! {"station_id": id, "used_vote": true}, None)
            .await?)
    }

    async fn list_parties(&self) -> Result<Vec<Party>> {
        let parties = self
            .parties
            .find(None, by_id())
            .await?
            .try_collect()
            .await?;
        Ok(parties)
    }

    async fn issue_pin(&self, pin: &IssuedPin) -> Result<bool> {
        match self
            .pins
            .replace_one(id_filter(pin.voter_id), pin, upsert())
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key_error(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_pin(&self, code: &str) -> Result<Option<IssuedPin>> {
        Ok(self.pins.find_one(doc! {"code": code}, None).await?)
    }

    async fn retire_pin(&self, code: &str) -> Result<bool> {
        let result = self.pins.delete_one(doc! {"code": code}, None).await?;
        Ok(result.deleted_count > 0)
    }
}
