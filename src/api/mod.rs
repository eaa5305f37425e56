use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};
use serde::Serialize;

mod candidates;
mod pins;
mod results;
mod voters;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(voters::routes());
    routes.extend(candidates::routes());
    routes.extend(pins::routes());
    routes.extend(results::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthenticated, forbidden, fallback]
}

/// Authentication failures carry no body.
#[catch(401)]
fn unauthenticated() {}

/// Authorization failures carry no body.
#[catch(403)]
fn forbidden() {}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    reason: &'static str,
}

#[catch(default)]
fn fallback(status: Status, _req: &Request<'_>) -> Json<ErrorBody> {
    Json(ErrorBody {
        status: status.code,
        reason: status.reason().unwrap_or("Unknown Error"),
    })
}
