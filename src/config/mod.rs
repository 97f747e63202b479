//! Configuration module for Babbage.
//!
//! Handles the catalog location, database connection and query limits.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, DatabaseSettings, QuerySettings, Settings, SettingsError,
};
