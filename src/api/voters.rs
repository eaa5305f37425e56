use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::{Postcode, Success, VotableStatus, VoterMatches, VoterName},
    auth::{endpoint, Permit},
    election::{StationId, VoterFlag, VoterId},
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![
        check_votable,
        get_voters,
        make_voter_ineligible,
        set_voter_has_active_pin,
    ]
}

#[get("/check_votable/<voter_id>")]
async fn check_votable(
    _permit: Permit<endpoint::CheckVotable>,
    voter_id: VoterId,
    store: Store,
) -> Result<Json<VotableStatus>> {
    let voter = store.get_voter_by_id(voter_id).await?;
    Ok(Json(voter.as_ref().into()))
}

#[get("/get_voters/station_id/<station_id>/voter_name/<voter_name>/postcode/<postcode>")]
async fn get_voters(
    _permit: Permit<endpoint::GetVoters>,
    station_id: StationId,
    voter_name: VoterName,
    postcode: Postcode,
    store: Store,
) -> Result<Json<VoterMatches>> {
    let voters = store
        .find_voters(station_id, &voter_name, &postcode)
        .await?;
    Ok(Json(voters.into()))
}

#[post("/make_voter_ineligible/<voter_id>")]
async fn make_voter_ineligible(
    permit: Permit<endpoint::MakeVoterIneligible>,
    voter_id: VoterId,
    store: Store,
) -> Result<Json<Success>> {
    let updated = store.set_voter_flag(voter_id, VoterFlag::UsedVote).await?;
    if updated {
        info!("Voter {voter_id} marked as voted by {}", permit.role());
    }
    Ok(Json(updated.into()))
}

#[post("/set_voter_has_active_pin/<voter_id>")]
async fn set_voter_has_active_pin(
    permit: Permit<endpoint::SetVoterHasActivePin>,
    voter_id: VoterId,
    store: Store,
) -> Result<Json<Success>> {
    let updated = store.set_voter_flag(voter_id, VoterFlag::ActivePin).await?;
    if updated {
        info!("Voter {voter_id} PIN activated by {}", permit.role());
    }
    Ok(Json(updated.into()))
}
