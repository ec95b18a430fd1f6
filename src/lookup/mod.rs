//! Metadata lookup against the Audiolibrix catalog

mod client;
mod error;
mod extract;

pub use client::{AudiolibrixClient, SearchOptions};
