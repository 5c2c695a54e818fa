use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier of a question, as named by the question service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Simple,
    Moderate,
    Difficult,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Simple, Difficulty::Moderate, Difficulty::Difficult];

    /// Ordering rank used when sorting a quiz: Simple=1, Moderate=2, Difficult=3.
    pub fn rank(self) -> u8 {
        match self {
            Difficulty::Simple => 1,
            Difficulty::Moderate => 2,
            Difficulty::Difficult => 3,
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Difficulty::Simple => "🟩",
            Difficulty::Moderate => "🟨",
            Difficulty::Difficult => "🟥",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Simple => "Simple",
            Difficulty::Moderate => "Moderate",
            Difficulty::Difficult => "Difficult",
        };
        f.write_str(name)
    }
}
