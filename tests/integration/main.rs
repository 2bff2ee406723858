//! Integration tests for ticker-feed

mod e2e_test;
mod feed_test;
