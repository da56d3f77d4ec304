//! Reference backends
//!
//! Stand-ins for a platform media framework so the engine can run without
//! one: a resolver answering from a TOML catalog, and a transport that
//! plays items against the tokio clock.

mod catalog;
mod clock;

pub use catalog::{CatalogEntry, CatalogResolver, CatalogTrack};
pub use clock::ClockTransport;
