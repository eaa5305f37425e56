use std::path::{Path, PathBuf};

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio::fs,
    Build, Rocket,
};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{
    api::MAX_PIN_LENGTH,
    auth::{Authorizer, CredentialRegistry, PermissionMatrix, RegistryError, Role, Secret},
    memory::{MemoryStore, Snapshot},
    mongodb::{ensure_indexes_exist, MongoStore},
    store::{ElectionStore, Store},
};

/// Default number of digits in an issued PIN.
const DEFAULT_PIN_LENGTH: u8 = 6;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_pin_length")]
    pin_length: u8,
}

fn default_pin_length() -> u8 {
    DEFAULT_PIN_LENGTH
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`pin_length` is {0}, but PINs must be 1 to {} digits", MAX_PIN_LENGTH)]
    PinLength(u8),
}

impl Config {
    /// Number of digits in each PIN issued by `get_pin_code`.
    pub fn pin_length(&self) -> usize {
        usize::from(self.pin_length)
    }

    /// Reject settings the API could not honour, such as PINs too long to be
    /// presented back in a path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (1..=MAX_PIN_LENGTH).contains(&self.pin_length()) {
            Ok(())
        } else {
            Err(ConfigError::PinLength(self.pin_length))
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if let Err(e) = config.validate() {
            error!("Invalid application config: {e}");
            return Err(rocket);
        }
        Ok(rocket.manage(config))
    }
}

/// The shared secret of every role, from the `api_keys` table.
#[derive(Deserialize)]
pub struct ApiKeys {
    station: Secret,
    booth: Secret,
    voter: Secret,
    results: Secret,
    pins: Secret,
    outcome: Secret,
}

impl TryFrom<ApiKeys> for CredentialRegistry {
    type Error = RegistryError;

    fn try_from(keys: ApiKeys) -> Result<Self, Self::Error> {
        CredentialRegistry::new([
            (Role::Station, keys.station),
            (Role::Booth, keys.booth),
            (Role::Voter, keys.voter),
            (Role::Results, keys.results),
            (Role::Pins, keys.pins),
            (Role::Outcome, keys.outcome),
        ])
    }
}

/// A fairing that loads the API keys once and places an [`Authorizer`] over
/// the static permission matrix into managed state.
///
/// The keys themselves are never logged or kept anywhere else.
pub struct AuthFairing;

#[rocket::async_trait]
impl Fairing for AuthFairing {
    fn info(&self) -> Info {
        Info {
            name: "API keys",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // The figment error may quote the offending value, so it is not printed.
        let keys = match rocket.figment().extract_inner::<ApiKeys>("api_keys") {
            Ok(keys) => keys,
            Err(_) => {
                error!("Failed to load API keys: every role needs a key in `api_keys`");
                return Err(rocket);
            }
        };
        let registry = match CredentialRegistry::try_from(keys) {
            Ok(registry) => registry,
            Err(e) => {
                error!("Invalid API keys: {e}");
                return Err(rocket);
            }
        };
        info!("Loaded API keys for {} roles", Role::ALL.len());
        Ok(rocket.manage(Authorizer::new(registry, PermissionMatrix)))
    }
}

/// Which [`crate::model::store::ElectionStore`] to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StoreKind {
    Mongodb,
    Memory,
}

/// Configuration for the data store.
#[derive(Deserialize)]
struct StoreConfig {
    store: StoreKind,
    // secrets
    db_uri: Option<String>,
    #[serde(default = "default_db_name")]
    db_name: String,
    seed_file: Option<PathBuf>,
}

fn default_db_name() -> String {
    "pollingday".to_string()
}

/// A fairing that loads the store config, connects to (or builds) the store,
/// performs any setup necessary, and places a [`Store`] into managed state.
pub struct StoreFairing;

impl StoreFairing {
    async fn mongo(config: StoreConfig) -> Result<Store, String> {
        let db_uri = config
            .db_uri
            .ok_or_else(|| "`db_uri` must be set for the mongodb store".to_string())?;
        info!("Loaded database config, connecting...");
        let client = MongoClient::with_uri_str(db_uri)
            .await
            .map_err(|e| format!("Failed to connect to database: {e}"))?;
        let db = client.database(&config.db_name);
        ensure_indexes_exist(&db)
            .await
            .map_err(|e| format!("Failed to connect to database: {e}"))?;
        info!("...database connection online!");
        let store = MongoStore::from_db(&db);

        // Seed data only ever goes into an empty database.
        if let Some(path) = config.seed_file {
            let provisioned = store
                .list_constituencies()
                .await
                .map_err(|e| format!("Failed to inspect database: {e}"))?;
            if provisioned.is_empty() {
                let snapshot = Self::load_seed(&path).await?;
                store
                    .import(snapshot)
                    .await
                    .map_err(|e| format!("Failed to import seed file {}: {e}", path.display()))?;
                info!("Imported seed file {}", path.display());
            } else {
                info!("Database already provisioned, ignoring seed file");
            }
        }
        Ok(Store::new(store))
    }

    async fn load_seed(path: &Path) -> Result<Snapshot, String> {
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read seed file {}: {e}", path.display()))?;
        rocket::serde::json::from_str::<Snapshot>(&json)
            .map_err(|e| format!("Failed to parse seed file {}: {e}", path.display()))
    }

    async fn memory(config: StoreConfig) -> Result<Store, String> {
        let snapshot = match config.seed_file {
            Some(path) => Self::load_seed(&path).await?,
            None => Snapshot::default(),
        };
        let store = MemoryStore::from_snapshot(snapshot)
            .map_err(|e| format!("Invalid seed data: {e}"))?;
        warn!("Using the in-memory store; data will not survive a restart");
        Ok(Store::new(store))
    }
}

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let store = match config.store {
            StoreKind::Mongodb => Self::mongo(config).await,
            StoreKind::Memory => Self::memory(config).await,
        };
        match store {
            Ok(store) => Ok(rocket.manage(store)),
            Err(e) => {
                error!("{e}");
                Err(rocket)
            }
        }
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use rocket::http::Header;

    use super::*;
    use crate::model::auth::AUTHORIZATION;

    impl Config {
        pub fn example() -> Self {
            Self::with_pin_length(DEFAULT_PIN_LENGTH)
        }

        pub fn with_pin_length(pin_length: u8) -> Self {
            Self { pin_length }
        }
    }

    impl ApiKeys {
        pub fn example() -> Self {
            Self {
                station: Secret::new(example_secret(Role::Station)),
                booth: Secret::new(example_secret(Role::Booth)),
                voter: Secret::new(example_secret(Role::Voter)),
                results: Secret::new(example_secret(Role::Results)),
                pins: Secret::new(example_secret(Role::Pins)),
                outcome: Secret::new(example_secret(Role::Outcome)),
            }
        }
    }

    pub fn example_secret(role: Role) -> String {
        format!("{role}-uYx%mfq;XglNP^G1OSKv")
    }

    /// The `Authorization` header a caller with `role` would send.
    pub fn credential(role: Role) -> Header<'static> {
        Header::new(AUTHORIZATION, format!("Basic {}", example_secret(role)))
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::examples::*;
    use super::*;

    #[test]
    fn example_keys_build_a_registry() {
        let registry = CredentialRegistry::try_from(ApiKeys::example()).unwrap();
        for role in Role::ALL {
            assert_eq!(registry.resolve(&example_secret(role)), Some(role));
        }
    }

    #[test]
    fn keys_load_from_figment() {
        let figment = Figment::from(Serialized::default(
            "api_keys",
            [
                ("station", "s"),
                ("booth", "b"),
                ("voter", "v"),
                ("results", "r"),
                ("pins", "p"),
                ("outcome", "o"),
            ]
            .into_iter()
            .collect::<std::collections::HashMap<_, _>>(),
        ));
        let keys = figment.extract_inner::<ApiKeys>("api_keys").unwrap();
        let registry = CredentialRegistry::try_from(keys).unwrap();
        assert_eq!(registry.resolve("p"), Some(Role::Pins));
    }

    #[test]
    fn shared_keys_are_rejected() {
        let mut keys = ApiKeys::example();
        keys.outcome = Secret::new(example_secret(Role::Results));
        assert_eq!(
            CredentialRegistry::try_from(keys).unwrap_err(),
            RegistryError::Duplicate(Role::Results, Role::Outcome)
        );
    }

    #[test]
    fn pin_length_defaults() {
        let config: Config = Figment::new().extract().unwrap();
        assert_eq!(config.pin_length(), usize::from(DEFAULT_PIN_LENGTH));
    }

    #[test]
    fn pin_length_must_fit_a_path() {
        for pin_length in [1, 6, 12] {
            let figment = Figment::from(Serialized::default("pin_length", pin_length));
            let config: Config = figment.extract().unwrap();
            assert_eq!(config.validate(), Ok(()));
        }
        for pin_length in [0, 13, 255] {
            let figment = Figment::from(Serialized::default("pin_length", pin_length));
            let config: Config = figment.extract().unwrap();
            assert_eq!(config.validate(), Err(ConfigError::PinLength(pin_length)));
        }
    }

    #[rocket::async_test]
    async fn overlong_pin_length_fails_ignition() {
        let figment = rocket::Config::figment().merge(("pin_length", 13));
        let rocket = rocket::custom(figment).attach(ConfigFairing);
        assert!(rocket.ignite().await.is_err());

        let figment = rocket::Config::figment().merge(("pin_length", 12));
        let rocket = rocket::custom(figment).attach(ConfigFairing);
        let rocket = rocket.ignite().await.unwrap();
        assert_eq!(rocket.state::<Config>().unwrap().pin_length(), 12);
    }

    #[test]
    fn demo_seed_is_valid() {
        let snapshot: Snapshot =
            rocket::serde::json::from_str(include_str!("../demo/seed.json")).unwrap();
        assert_eq!(snapshot.voters.len(), 3);
        MemoryStore::from_snapshot(snapshot).unwrap();
    }

    #[test]
    fn store_kind_is_lowercase() {
        let figment = Figment::from(Serialized::default("store", "memory"));
        let config: StoreConfig = figment.extract().unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.db_name, "pollingday");
        assert!(config.seed_file.is_none());
    }
}
