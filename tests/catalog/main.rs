//! Catalog session integration tests.
//!
//! Exercises whole sessions against a shared in-memory store:
//! - First-visitor admin election across sessions
//! - Entries written by one session arriving in every gallery
//! - Search, sort and lightbox over live snapshots

mod support;
mod election;
mod entries;
mod gallery;
#[cfg(feature = "http")]
mod http;
