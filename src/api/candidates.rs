use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::CandidateMatches,
    auth::{endpoint, Permit},
    election::StationId,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![get_candidates]
}

/// Candidates standing in the constituency of the given station.
///
/// `success` is false both for an unknown station and for a constituency
/// with no candidates.
#[get("/get_candidates/<station_id>")]
async fn get_candidates(
    _permit: Permit<endpoint::GetCandidates>,
    station_id: StationId,
    store: Store,
) -> Result<Json<CandidateMatches>> {
    let candidates = match store.get_station_by_id(station_id).await? {
        Some(station) => {
            store
                .find_candidates_by_constituency(station.constituency_id)
                .await?
        }
        None => Vec::new(),
    };
    Ok(Json(candidates.into()))
}
