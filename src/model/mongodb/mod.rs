mod collection;
mod errors;
mod store;
#[cfg(test)]
pub mod testing;

pub use collection::{ensure_indexes_exist, id_filter, Coll, MongoCollection};
pub use errors::{is_duplicate_key_error, DUPLICATE_KEY};
pub use store::MongoStore;
