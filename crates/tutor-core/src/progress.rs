//! XP accrual and the level ladder.

use crate::profile::{Level, StudentProfile};

/// XP awarded when the backend marks the student's sentence error-free.
pub const XP_PERFECT_TURN: u32 = 10;

/// XP awarded for any other processed turn.
pub const XP_EFFORT: u32 = 1;

/// XP required to reach each level. Promotion happens once `xp` meets the
/// threshold of the level directly above the current one.
const LADDER: [(Level, u32); 5] = [
    (Level::Intermediate, 100),
    (Level::Advanced, 250),
    (Level::Expert, 500),
    (Level::Master, 1000),
    (Level::Legend, 2000),
];

/// The level a student at `level` with `xp` points should be promoted to,
/// if any. Only ever the immediately-next level: a turn can cross at most
/// one threshold boundary no matter how much XP it awards.
pub fn promotion_for(level: Level, xp: u32) -> Option<Level> {
    let next = level.next()?;
    let (_, required) = LADDER.iter().find(|(target, _)| *target == next)?;
    (xp >= *required).then_some(next)
}

/// Outcome of applying a turn's XP to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnProgress {
    /// XP added this turn.
    pub earned: u32,
    /// New level, when the turn crossed a threshold.
    pub promoted: Option<Level>,
}

impl TurnProgress {
    /// Apply a turn's XP to the profile and promote at most one level.
    pub fn apply(profile: &mut StudentProfile, earned: u32) -> Self {
        profile.xp = profile.xp.saturating_add(earned);
        let promoted = promotion_for(profile.level, profile.xp);
        if let Some(level) = promoted {
            profile.level = level;
        }
        Self { earned, promoted }
    }
}
