//! Scratch databases for tests against a live MongoDB server.

use std::time::Duration;

use mongodb::{bson::doc, options::ClientOptions, Client, Database};

use super::ensure_indexes_exist;

/// Set to fail, rather than skip, database tests when no server answers.
pub const REQUIRE_MONGO: &str = "POLLINGDAY_REQUIRE_MONGO";

/// A fresh, indexed database on the server at the configured `db_uri`.
///
/// Returns `None` if no server answers, unless [`REQUIRE_MONGO`] is set.
pub async fn scratch_database() -> Option<Database> {
    let db_uri: String = rocket::Config::figment()
        .extract_inner("db_uri")
        .expect("`db_uri` not set");
    let mut options = ClientOptions::parse(&db_uri)
        .await
        .expect("`db_uri` is not a MongoDB connection string");
    options.server_selection_timeout = Some(Duration::from_secs(2));
    let client = Client::with_options(options).unwrap();

    let name = format!("pollingday_test_{:08x}", rand::random::<u32>());
    let db = client.database(&name);
    if let Err(err) = db.run_command(doc! {"ping": 1}, None).await {
        if std::env::var_os(REQUIRE_MONGO).is_some() {
            panic!("No MongoDB server at the configured `db_uri`: {err}");
        }
        eprintln!("Skipping database test, no MongoDB server at the configured `db_uri`");
        return None;
    }
    ensure_indexes_exist(&db).await.unwrap();
    Some(db)
}
