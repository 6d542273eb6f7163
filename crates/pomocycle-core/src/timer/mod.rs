mod duration;
mod engine;
mod ticker;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use duration::{format_clock, PhaseDuration};
pub use engine::{CountdownEngine, CountdownStatus};
pub use ticker::Ticker;

/// Which half of a timer instance is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
