//! End-to-end tests against mock upstream servers

mod scrape_tests;
mod search_tests;
