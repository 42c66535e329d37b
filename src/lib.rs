//! quakemap - recent earthquakes on a world map.
//!
//! Fetches the USGS summary feeds, normalizes and filters the events, and
//! hands them to a map view served from an embedded web server or printed
//! to the terminal.

pub mod cli;
pub mod dashboard;
pub mod errors;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod output;
pub mod presentation;
pub mod server;
pub mod state;
