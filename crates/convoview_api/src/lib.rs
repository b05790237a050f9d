//! Stable, panic-free entry points for embedding convoview in a host app.

pub mod api;

pub use api::*;
