pub mod classifier;
pub mod config_store;
pub mod runtime_engine;
