use std::ops::Deref;

use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use crate::model::election::{Candidate, Constituency, IssuedPin, Party, Station, Voter};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Filter matching the document with the given integer `_id`.
pub fn id_filter(id: u32) -> Document {
    doc! { "_id": id }
}

impl MongoCollection for Constituency {
    const NAME: &'static str = "constituencies";
}

impl MongoCollection for Station {
    const NAME: &'static str = "stations";
}

impl MongoCollection for Voter {
    const NAME: &'static str = "voters";
}

impl MongoCollection for Party {
    const NAME: &'static str = "parties";
}

impl MongoCollection for Candidate {
    const NAME: &'static str = "candidates";
}

impl MongoCollection for IssuedPin {
    const NAME: &'static str = "pins";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Voter lookups are always scoped to a station.
    let voter_index = IndexModel::builder()
        .keys(doc! {"station_id": 1, "postcode": 1})
        .build();
    Coll::<Voter>::from_db(db)
        .create_index(voter_index, None)
        .await?;

    let station_index = IndexModel::builder()
        .keys(doc! {"constituency_id": 1})
        .build();
    Coll::<Station>::from_db(db)
        .create_index(station_index, None)
        .await?;

    let candidate_index = IndexModel::builder()
        .keys(doc! {"constituency_id": 1})
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // One voter per PIN code; one PIN per voter is given by `_id`.
    let pin_index = IndexModel::builder()
        .keys(doc! {"code": 1})
        .options(unique)
        .build();
    Coll::<IssuedPin>::from_db(db)
        .create_index(pin_index, None)
        .await?;

    Ok(())
}
