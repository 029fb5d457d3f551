// Library for tests to access modules

pub mod classifier;
pub mod command_repo;
pub mod config;
pub mod coordinator;
pub mod correlator;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod prom_repo;
pub mod routes;
pub mod source;
pub mod version;
pub mod worker;
