/// Database configuration and connection management
pub mod database;

/// Settings loading from the `CAPNOTE_CONFIG` TOML file
pub mod settings;

/// Session configuration from environment variables
pub mod users;
