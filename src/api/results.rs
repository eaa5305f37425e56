use std::collections::HashMap;

use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::{CandidateTally, ConstituencyResult, TurnoutEntry},
    auth::{endpoint, Permit},
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![turnout_report, constituency_results]
}

/// Registered and voted counts for every constituency.
#[get("/turnout_report")]
async fn turnout_report(
    _permit: Permit<endpoint::TurnoutReport>,
    store: Store,
) -> Result<Json<Vec<TurnoutEntry>>> {
    let mut report = Vec::new();
    for constituency in store.list_constituencies().await? {
        let mut entry = TurnoutEntry {
            constituency_id: constituency.id,
            constituency_name: constituency.name,
            voted: 0,
            registered: 0,
        };
        for station in store.list_stations_by_constituency(constituency.id).await? {
            entry.voted += store.count_used_votes_by_station(station.id).await?;
            entry.registered += store.count_voters_by_station(station.id).await?;
        }
        report.push(entry);
    }
    Ok(Json(report))
}

#[get("/constituency_results")]
async fn constituency_results(
    _permit: Permit<endpoint::ConstituencyResults>,
    store: Store,
) -> Result<Json<Vec<ConstituencyResult>>> {
    let parties: HashMap<_, _> = store
        .list_parties()
        .await?
        .into_iter()
        .map(|party| (party.id, party.name))
        .collect();

    let mut results = Vec::new();
    for constituency in store.list_constituencies().await? {
        let mut candidates: Vec<CandidateTally> = store
            .find_candidates_by_constituency(constituency.id)
            .await?
            .into_iter()
            .map(|candidate| CandidateTally {
                candidate_id: candidate.id,
                party_name: parties.get(&candidate.party_id).cloned(),
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                votes: candidate.votes,
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });
        results.push(ConstituencyResult {
            constituency_id: constituency.id,
            constituency_name: constituency.name,
            candidates,
        });
    }
    Ok(Json(results))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;
    use crate::config::examples::credential;
    use crate::model::{
        auth::Role,
        election::VoterFlag,
        memory::{examples::*, MemoryStore},
        store::ElectionStore,
    };

    async fn turnout(client: &Client) -> Vec<TurnoutEntry> {
        let response = client
            .get(uri!(turnout_report))
            .header(credential(Role::Outcome))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test]
    async fn turnout_covers_every_constituency(client: Client, store: MemoryStore) {
        let report = turnout(&client).await;
        let constituencies = store.list_constituencies().await.unwrap();
        assert_eq!(report.len(), constituencies.len());
        assert!(report.iter().all(|entry| entry.voted <= entry.registered));

        let richmond = report
            .iter()
            .find(|entry| entry.constituency_id == RICHMOND_PARK)
            .unwrap();
        assert_eq!(richmond.constituency_name, "Richmond Park");
        assert_eq!((richmond.voted, richmond.registered), (1, 3));

        let uncontested = report
            .iter()
            .find(|entry| entry.constituency_id == UNCONTESTED)
            .unwrap();
        assert_eq!((uncontested.voted, uncontested.registered), (0, 0));
    }

    #[backend_test]
    async fn turnout_reflects_current_state(client: Client, store: MemoryStore) {
        store
            .set_voter_flag(GOOLE_VOTER, VoterFlag::UsedVote)
            .await
            .unwrap();

        let report = turnout(&client).await;
        let goole = report
            .iter()
            .find(|entry| entry.constituency_id == BRIGG_AND_GOOLE)
            .unwrap();
        assert_eq!((goole.voted, goole.registered), (1, 1));
    }

    #[backend_test(empty)]
    async fn turnout_of_empty_store(client: Client) {
        assert!(turnout(&client).await.is_empty());
    }

    #[backend_test]
    async fn turnout_is_outcome_only(client: Client) {
        for role in [Role::Station, Role::Booth, Role::Voter, Role::Results, Role::Pins] {
            let response = client
                .get(uri!(turnout_report))
                .header(credential(role))
                .dispatch()
                .await;
            assert_eq!(Status::Forbidden, response.status(), "{role}");
        }
    }

    #[backend_test]
    async fn results_rank_candidates(client: Client, store: MemoryStore) {
        store.record_vote(BOOTHROYD_CANDIDATE).await.unwrap();

        let response = client
            .get(uri!(constituency_results))
            .header(credential(Role::Outcome))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let results: Vec<ConstituencyResult> = response.into_json().await.unwrap();
        assert_eq!(results.len(), 3);

        let richmond = &results[0];
        assert_eq!(richmond.constituency_id, RICHMOND_PARK);
        let ranked: Vec<_> = richmond
            .candidates
            .iter()
            .map(|c| (c.candidate_id, c.votes))
            .collect();
        assert_eq!(ranked, vec![(BOOTHROYD_CANDIDATE, 1), (BOND_CANDIDATE, 0)]);
        assert_eq!(
            richmond.candidates[0].party_name.as_deref(),
            Some("Secret Service")
        );
        assert!(results[2].candidates.is_empty());
    }
}
