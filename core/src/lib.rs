pub mod config;
pub mod connection;
pub mod errors;
pub mod files;
pub mod fs;
pub mod paths;
pub mod protocol;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testutil;
