pub mod api;
pub mod auth;
pub mod election;
pub mod memory;
pub mod mongodb;
pub mod store;
