//! Discourse knowledge-base scraper library.
//!
//! Crawls one category of a Discourse forum with an authenticated session,
//! keeps the topics created within a date range, and writes each topic's
//! normalized posts plus a combined corpus and a run summary as JSON.

pub mod config;
pub mod constants;
pub mod discourse;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod scrape;
pub mod session;
