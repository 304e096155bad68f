pub mod agent;
pub mod caps;
pub mod client;
pub mod common;
pub mod errors;
pub mod importer;
pub mod model;
pub mod orchestrator;
pub mod runtime;
