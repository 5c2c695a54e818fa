use crate::error::ConfigError;
use crate::types::Difficulty;

/// Time allotment and point value of one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierConfig {
    pub allotted_seconds: u32,
    pub points: u32,
}

/// Standard tier table, in rank order.
pub const STANDARD_TIERS: [(Difficulty, TierConfig); 3] = [
    (Difficulty::Simple, TierConfig { allotted_seconds: 10, points: 1 }),
    (Difficulty::Moderate, TierConfig { allotted_seconds: 20, points: 2 }),
    (Difficulty::Difficult, TierConfig { allotted_seconds: 30, points: 3 }),
];

/// Lookup from difficulty tier to its [`TierConfig`].
///
/// Built only through [`DifficultyPolicy::new`], which rejects tables that miss
/// a tier, repeat one, or carry zero values, so `tier` is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyPolicy {
    tiers: [TierConfig; 3],
}

impl DifficultyPolicy {
    pub fn new(entries: &[(Difficulty, TierConfig)]) -> Result<Self, ConfigError> {
        let mut tiers: [Option<TierConfig>; 3] = [None; 3];
        for (difficulty, config) in entries {
            let slot = &mut tiers[Self::slot(*difficulty)];
            if slot.is_some() {
                return Err(ConfigError::DuplicateTier(*difficulty));
            }
            if config.allotted_seconds == 0 || config.points == 0 {
                return Err(ConfigError::NonPositiveTier(*difficulty));
            }
            *slot = Some(*config);
        }

        let mut checked = [TierConfig { allotted_seconds: 0, points: 0 }; 3];
        for difficulty in Difficulty::ALL {
            checked[Self::slot(difficulty)] =
                tiers[Self::slot(difficulty)].ok_or(ConfigError::MissingTier(difficulty))?;
        }
        Ok(Self { tiers: checked })
    }

    /// Simple = 10s/1pt, Moderate = 20s/2pt, Difficult = 30s/3pt.
    pub fn standard() -> Self {
        Self {
            tiers: [STANDARD_TIERS[0].1, STANDARD_TIERS[1].1, STANDARD_TIERS[2].1],
        }
    }

    pub fn tier(&self, difficulty: Difficulty) -> TierConfig {
        self.tiers[Self::slot(difficulty)]
    }

    pub fn allotted_seconds(&self, difficulty: Difficulty) -> u32 {
        self.tier(difficulty).allotted_seconds
    }

    pub fn points(&self, difficulty: Difficulty) -> u32 {
        self.tier(difficulty).points
    }

    fn slot(difficulty: Difficulty) -> usize {
        usize::from(difficulty.rank() - 1)
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Nominal question mix requested from the question service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Curriculum {
    pub simple: u32,
    pub moderate: u32,
    pub difficult: u32,
}

impl Curriculum {
    /// 5 Simple, 5 Moderate, 5 Difficult.
    pub const STANDARD: Curriculum = Curriculum { simple: 5, moderate: 5, difficult: 5 };

    pub fn count(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Simple => self.simple,
            Difficulty::Moderate => self.moderate,
            Difficulty::Difficult => self.difficult,
        }
    }

    /// Ceiling score for this mix. It does not look at what a provider actually
    /// returned.
    pub fn max_score(&self, policy: &DifficultyPolicy) -> u32 {
        Difficulty::ALL
            .iter()
            .map(|d| self.count(*d) * policy.points(*d))
            .sum()
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::STANDARD
    }
}
