use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub level: u8,
    pub title: &'static str,
    pub xp: u64,
}

pub const LEVELS: [Level; 10] = [
    Level { level: 1, title: "Beginner", xp: 0 },
    Level { level: 2, title: "Novice", xp: 100 },
    Level { level: 3, title: "Apprentice", xp: 300 },
    Level { level: 4, title: "Intermediate", xp: 600 },
    Level { level: 5, title: "Advanced", xp: 1000 },
    Level { level: 6, title: "Expert", xp: 1500 },
    Level { level: 7, title: "Master", xp: 2500 },
    Level { level: 8, title: "Grandmaster", xp: 4000 },
    Level { level: 9, title: "Legend", xp: 6000 },
    Level { level: 10, title: "Elite Trader", xp: 10000 },
];

/// Highest level whose threshold is at or below `xp`.
pub fn current_level(xp: u64) -> &'static Level {
    let index = LEVELS.partition_point(|l| l.xp <= xp);
    &LEVELS[index.saturating_sub(1)]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: &'static Level,
    pub xp: u64,
    /// Threshold of the next level, or of the top level once it is reached.
    pub next_threshold: u64,
    pub percent: f64,
}

pub fn level_progress(xp: u64) -> LevelProgress {
    let level = current_level(xp);
    let next = LEVELS
        .get(usize::from(level.level))
        .unwrap_or(&LEVELS[LEVELS.len() - 1]);

    let span = next.xp.saturating_sub(level.xp);
    let percent = if span == 0 {
        100.0
    } else {
        ((xp - level.xp) as f64 / span as f64 * 100.0).min(100.0)
    };

    LevelProgress {
        level,
        xp,
        next_threshold: next.xp,
        percent,
    }
}
