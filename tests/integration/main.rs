//! Integration tests for Lemma-Search
//!
//! Each module drives the public `Engine` API against a wiremock server.

mod common;
mod crawl_tests;
mod search_tests;
