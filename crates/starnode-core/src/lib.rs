pub mod config;
pub mod logging;

pub mod artifact;
pub mod checksum;
pub mod control;
pub mod extract;
pub mod fetch;
pub mod install;
pub mod layout;
pub mod mirror;
pub mod platform;
pub mod retry;
pub mod service;
pub mod storage;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
