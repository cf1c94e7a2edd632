pub mod replication;
pub mod sessions;
pub mod store;
