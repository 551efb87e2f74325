//! Client library for the Vagrant Cloud box hosting API.
//!
//! Remote resources (organizations, boxes, versions and providers) are
//! mirrored locally as change-tracking objects. Callers mutate them through
//! typed setters and call `save`, which sends only what changed and cascades
//! through the resource tree.
//!
//! # Modules
//!
//! - `data`: attribute schemas and change-tracking state containers
//! - `auth`: bearer token resolution and OAuth client credentials exchange
//! - `transport`: wire seam and the `reqwest` implementation
//! - `client`: request building, retries and every API endpoint
//! - `instrumentor`: named events with subscriptions and redaction
//! - `organization`, `boxes`: the resource hierarchy
//! - `account`, `search`, `response`: account operations and box search
//! - `configuration`: persisted client settings
//! - `commands`: command line definitions for the `vagrant-cloud` binary

#[macro_use]
mod macros;

pub mod account;
pub mod auth;
pub mod boxes;
pub mod client;
pub mod commands;
pub mod configuration;
pub mod data;
pub mod error;
pub mod exit_codes;
pub mod instrumentor;
pub mod organization;
pub mod response;
pub mod search;
pub mod transport;

#[cfg(test)]
mod testing;

pub use account::Account;
pub use boxes::{Provider, VagrantBox, Version};
pub use client::{Client, ClientBuilder};
pub use error::{Error, ErrorKind, Result};
pub use organization::Organization;
pub use search::Search;
