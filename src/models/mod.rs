//! Data models for the DataRun application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Park: Catalog entries read by the ranking pipeline
//! - Candidate: Scored evaluations of a park for one query

pub mod candidate;
pub mod location;
pub mod park;

// Re-export all public types for convenient access
pub use candidate::{Candidate, ElevationCategory, RankingResult, sort_by_score};
pub use location::Coordinate;
pub use park::Park;
