//! Common utilities for fontsieve.
//!
//! This crate provides shared infrastructure used by all fontsieve components:
//! - **Warning System** - colored terminal output for skipped rules and values
//! - **URL Utilities** - resolution against a style sheet base, fragment and
//!   query stripping, percent-decoding

pub mod url;
pub mod warning;
