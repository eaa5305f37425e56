use rand::distributions::{Distribution, Uniform};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{PinCode, PinEligibility, PinIssued, Success},
    auth::{endpoint, Permit},
    election::{CandidateId, IssuedPin, Voter, VoterFlag, VoterId},
    store::Store,
};

/// How many fresh codes to try before giving up on a collision streak.
const PIN_ATTEMPTS: usize = 8;

pub fn routes() -> Vec<Route> {
    routes![
        get_pin_code,
        verify_and_check_eligibility,
        verify_and_make_ineligible,
        cast_vote,
    ]
}

/// A random string of `length` decimal digits.
fn generate_pin(length: usize) -> String {
    let digit_dist = Uniform::from(b'0'..=b'9');
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(digit_dist.sample(&mut rng)))
        .collect()
}

/// The voter holding `pin`, provided their PIN has been activated.
async fn voter_for_pin(store: &Store, pin: &PinCode) -> Result<Option<Voter>> {
    let Some(issued) = store.find_pin(pin).await? else {
        return Ok(None);
    };
    let voter = store.get_voter_by_id(issued.voter_id).await?;
    Ok(voter.filter(|voter| voter.active_pin))
}

/// Issue a fresh PIN to a voter who has yet to vote.
///
/// The new PIN replaces any earlier one. Activation is a flag on the voter
/// and is never cleared, so once activated a reissued PIN is valid at once.
#[post("/get_pin_code/<voter_id>")]
async fn get_pin_code(
    _permit: Permit<endpoint::GetPinCode>,
    voter_id: VoterId,
    store: Store,
    config: &State<Config>,
) -> Result<Json<PinIssued>> {
    let eligible = store
        .get_voter_by_id(voter_id)
        .await?
        .map_or(false, |voter| !voter.used_vote);
    if !eligible {
        return Ok(Json(PinIssued {
            success: false,
            pin_code: None,
        }));
    }

    for _ in 0..PIN_ATTEMPTS {
        let code = generate_pin(config.pin_length());
        if store.issue_pin(&IssuedPin::new(voter_id, code.clone())).await? {
            info!("Issued PIN to voter {voter_id}");
            return Ok(Json(PinIssued {
                success: true,
                pin_code: Some(code),
            }));
        }
        debug!("PIN collision for voter {voter_id}, retrying");
    }
    Err(Error::Status(
        Status::ServiceUnavailable,
        format!("Could not allocate a unique PIN for voter {voter_id}"),
    ))
}

#[get("/verify_and_check_eligibility/<pin>")]
async fn verify_and_check_eligibility(
    _permit: Permit<endpoint::VerifyAndCheckEligibility>,
    pin: PinCode,
    store: Store,
) -> Result<Json<PinEligibility>> {
    let voter = voter_for_pin(&store, &pin).await?;
    Ok(Json(PinEligibility {
        pin_valid: voter.is_some(),
        used_vote: voter.map(|voter| voter.used_vote),
    }))
}

#[post("/verify_and_make_ineligible/<pin>")]
async fn verify_and_make_ineligible(
    permit: Permit<endpoint::VerifyAndMakeIneligible>,
    pin: PinCode,
    store: Store,
) -> Result<Json<Success>> {
    let Some(voter) = voter_for_pin(&store, &pin).await? else {
        return Ok(Json(false.into()));
    };
    let updated = store.set_voter_flag(voter.id, VoterFlag::UsedVote).await?;
    store.retire_pin(&pin).await?;
    if updated {
        info!("Voter {} marked as voted by {}", voter.id, permit.role());
    }
    Ok(Json(updated.into()))
}

/// Record a ballot for `candidate_id` on behalf of the voter holding `pin`.
///
/// The candidate must stand in the voter's constituency. The vote is only
/// recorded if this request is the one that flips `used_vote`.
#[post("/cast_vote/<pin>/<candidate_id>")]
async fn cast_vote(
    _permit: Permit<endpoint::CastVote>,
    pin: PinCode,
    candidate_id: CandidateId,
    store: Store,
) -> Result<Json<Success>> {
    let Some(voter) = voter_for_pin(&store, &pin).await? else {
        return Ok(Json(false.into()));
    };
    if voter.used_vote {
        return Ok(Json(false.into()));
    }
    let Some(station) = store.get_station_by_id(voter.station_id).await? else {
        return Ok(Json(false.into()));
    };
    let Some(candidate) = store.get_candidate_by_id(candidate_id).await? else {
        return Ok(Json(false.into()));
    };
    if candidate.constituency_id != station.constituency_id {
        warn!(
            "Voter {} tried to vote for candidate {} outside their constituency",
            voter.id, candidate.id
        );
        return Ok(Json(false.into()));
    }

    if !store.mark_vote_cast(voter.id).await? {
        return Ok(Json(false.into()));
    }
    let recorded = match store.record_vote(candidate.id).await {
        Ok(recorded) => recorded,
        Err(e) => {
            error!(
                "Voter {} was marked as voted but the ballot for candidate {} was not recorded",
                voter.id, candidate.id
            );
            return Err(e);
        }
    };
    if !recorded {
        return Err(Error::Status(
            Status::InternalServerError,
            format!(
                "Voter {} was marked as voted but candidate {} has disappeared",
                voter.id, candidate.id
            ),
        ));
    }
    store.retire_pin(&pin).await?;
    info!("Ballot cast by voter {}", voter.id);
    Ok(Json(true.into()))
}
