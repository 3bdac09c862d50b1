// Domain types
pub mod types;

// Errors and cancellation
pub mod cancel;
pub mod error;

// External collaborator contracts and their HTTP adapters
pub mod providers;
pub mod services;

// Competitor analysis
pub mod analysis;

// Brief wizard
pub mod brief;

// Article generation and paragraph rewrites
pub mod article;

// Input parsing
pub mod inputs;

// Sessions, persistence and autosave
pub mod autosave;
pub mod database;
pub mod session;

// Environment settings
pub mod config;

// Command line
pub mod cli;
pub mod commands;

pub use error::{BriefError, BriefResult};
