//! Concurrent scraping-and-aggregation pipeline.
//!
//! Leaves first: [`stars`] converts rating glyphs to numbers, [`page`]
//! fetches and parses one listing page, [`user`] drives a bounded page
//! window for one user, [`fleet`] runs many users under a single shared
//! concurrency gate, and [`discover`] enumerates popular usernames until a
//! target count is reached.

pub mod discover;
pub mod fleet;
pub mod page;
pub mod stars;
pub mod user;
