mod error;
pub use error::{Error, Result};

pub mod config;
pub mod slug;
pub mod token;

pub mod provider;
pub mod ext_awssso;

pub mod oauth_awssso;
pub mod poller;
pub mod enumerator;
pub mod render;

pub mod cmd;

#[cfg(test)]
mod testing;
