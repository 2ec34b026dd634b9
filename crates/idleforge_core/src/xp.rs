//! # XP / Level Model
//!
//! A threshold table maps accumulated XP to a level. Entry `i` holds the
//! cumulative XP needed for level `i + 1`, so level 1 always starts at 0 XP.
//!
//! Lookups are total: any XP value maps to a level in `1..=max_level`, and the
//! mapping is monotonic because the table is strictly increasing.

use crate::error::{CoreError, CoreResult};

/// Highest level of the standard curve.
pub const MAX_LEVEL: u32 = 99;

/// Monotonic XP threshold table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XpTable {
    thresholds: Vec<u64>,
}

/// Where an XP value sits inside its level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    /// Derived level.
    pub level: u32,
    /// XP earned since the start of `level`.
    pub into_level: u64,
    /// XP still needed for the next level, `None` at the cap.
    pub to_next: Option<u64>,
}

impl XpTable {
    /// The standard 99-level curve.
    #[must_use]
    pub fn standard() -> Self {
        Self::curve(MAX_LEVEL)
    }

    /// Builds the exponential curve up to `max_level` (at least 1).
    ///
    /// Each level adds `floor(l + 300 * 2^(l / 7))` points and the threshold is
    /// a quarter of the running total. Pure: the same input always yields the
    /// same table.
    #[must_use]
    pub fn curve(max_level: u32) -> Self {
        let max_level = max_level.max(1);
        let mut thresholds = Vec::with_capacity(max_level as usize);
        thresholds.push(0);

        let mut points = 0.0_f64;
        for level in 1..max_level {
            let l = f64::from(level);
            points += (l + 300.0 * 2.0_f64.powf(l / 7.0)).floor();
            thresholds.push((points / 4.0).floor() as u64);
        }

        Self { thresholds }
    }

    /// Wraps an explicit threshold list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidXpTable`] if the list is empty, does not
    /// start at 0, or is not strictly increasing.
    pub fn from_thresholds(thresholds: Vec<u64>) -> CoreResult<Self> {
        match thresholds.first() {
            None => {
                return Err(CoreError::InvalidXpTable("table is empty".to_string()));
            }
            Some(&first) if first != 0 => {
                return Err(CoreError::InvalidXpTable(format!(
                    "level 1 must start at 0 xp, got {first}"
                )));
            }
            Some(_) => {}
        }

        if let Some(idx) = thresholds.windows(2).position(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidXpTable(format!(
                "threshold for level {} ({}) is not above level {} ({})",
                idx + 2,
                thresholds[idx + 1],
                idx + 1,
                thresholds[idx]
            )));
        }

        Ok(Self { thresholds })
    }

    /// Highest reachable level.
    #[inline]
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Greatest level whose threshold is at or below `xp`.
    #[inline]
    #[must_use]
    pub fn level_for(&self, xp: u64) -> u32 {
        // thresholds[0] == 0, so at least one entry always matches
        self.thresholds.partition_point(|&t| t <= xp).max(1) as u32
    }

    /// Cumulative XP required for `level`, clamped to the table.
    #[must_use]
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let idx = level.clamp(1, self.max_level()) as usize - 1;
        self.thresholds[idx]
    }

    /// Level plus XP into and remaining for that level.
    #[must_use]
    pub fn progress(&self, xp: u64) -> LevelProgress {
        let level = self.level_for(xp);
        let floor = self.xp_for_level(level);
        let to_next = (level < self.max_level()).then(|| self.xp_for_level(level + 1) - xp);

        LevelProgress {
            level,
            into_level: xp - floor,
            to_next,
        }
    }
}

impl Default for XpTable {
    fn default() -> Self {
        Self::standard()
    }
}
