pub mod config;
pub mod error;
pub mod falcon;
pub mod fetch;
pub mod handler;
pub mod hide;
pub mod infra;
pub mod outcome;
pub mod services;
pub mod startup;
