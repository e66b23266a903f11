//! Bounded-concurrency scraper for publicly indexed chat-assistant share pages.
//!
//! # Modules
//!
//! | Stage | Module | Role |
//! |-------|--------|------|
//! | Sources | [`sources`] | Registry of providers, their index endpoints and extraction rules |
//! | Discovery | [`discovery`] | Fetch an index listing and deduplicate share URLs |
//! | Selection | [`selection`] | Narrow the list to all / a range / the first N |
//! | Rendering | [`render`] | Page-rendering capability and its HTTP binding |
//! | Extraction | [`extractor`] | Selector + filtering rules → cleaned text |
//! | Scheduling | [`scheduler`] | Batches, permits, cooldowns, isolated failures |
//! | Output | [`sink`] | Append-only framed record store |
//!
//! [`pipeline::scrape_source`] wires one source through all of them.

pub mod cli;
pub mod discovery;
pub mod errors;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod politeness;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod sink;
pub mod sources;
pub mod utils;
