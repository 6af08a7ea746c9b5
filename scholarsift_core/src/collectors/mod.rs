//! Concrete collectors for the configured scholarship sources.
//!
//! DAAD and HEC have dedicated page parsers; every other source goes through
//! [`generic::GenericCollector`] (feeds first, then page links).
//!
//! Parsing is synchronous and runs on the [`crate::cpu_pool`], so each
//! collector splits into an async fetch and a pure `parse_*` function that the
//! tests drive with fixture markup.

pub mod daad;
pub mod extract;
pub mod generic;
pub mod hec;
mod http;

pub use daad::DaadCollector;
pub use generic::GenericCollector;
pub use hec::HecCollector;
pub use http::build_client;
