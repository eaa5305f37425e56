#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ApiKeys, AuthFairing, Config, ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::model::{
    auth::{Authorizer, CredentialRegistry, PermissionMatrix, RegistryError},
    store::Store,
};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// The server as configured by `Rocket.toml`, with the store and API keys
/// loaded during ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(AuthFairing)
        .attach(StoreFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// The server over an already-built store and key set, skipping the
/// configuration fairings.
pub fn rocket_for_store(
    store: Store,
    config: Config,
    keys: ApiKeys,
) -> Result<Rocket<Build>, RegistryError> {
    let registry = CredentialRegistry::try_from(keys)?;
    Ok(rocket::build()
        .attach(LoggerFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage(store)
        .manage(config)
        .manage(Authorizer::new(registry, PermissionMatrix)))
}
