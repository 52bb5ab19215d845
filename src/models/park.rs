//! Park catalog entry

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A park that can be recommended for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    /// Display name
    pub name: String,
    /// Street address, when the source provides one
    pub address: Option<String>,
    /// Where the park is
    pub location: Coordinate,
}

impl Park {
    #[must_use]
    pub fn new(name: impl Into<String>, address: Option<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            address,
            location,
        }
    }
}
