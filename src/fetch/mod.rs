mod basic;
mod client;
pub mod auth;
#[cfg(test)]
pub(crate) mod testing;

pub use basic::BasicClient;
pub use client::HttpClient;
