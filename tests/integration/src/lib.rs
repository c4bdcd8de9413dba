//! Integration test utilities for the role keeper
//!
//! In-memory implementations of every port and fixtures for driving the
//! engine end to end without PostgreSQL or Discord.

pub mod fakes;
pub mod fixtures;

pub use fakes::*;
pub use fixtures::*;
