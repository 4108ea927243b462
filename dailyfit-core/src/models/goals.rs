use serde::{Deserialize, Serialize};
use std::fmt;

/// The user's daily targets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goals {
    /// Target body weight in kg
    pub weight: u32,
    /// Daily step count
    pub steps: u32,
    /// Daily intake in kcal
    pub calories: u32,
    /// Daily water in ml
    pub water: u32,
}

impl fmt::Display for Goals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weight:   {} kg", self.weight)?;
        writeln!(f, "Steps:    {}", self.steps)?;
        writeln!(f, "Calories: {} kcal", self.calories)?;
        write!(f, "Water:    {} ml", self.water)
    }
}

/// Which goal a value or range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    Weight,
    Steps,
    Calories,
    Water,
}

impl GoalKind {
    pub fn unit(&self) -> &'static str {
        match self {
            GoalKind::Weight => "kg",
            GoalKind::Steps => "steps",
            GoalKind::Calories => "kcal",
            GoalKind::Water => "ml",
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalKind::Weight => "weight",
            GoalKind::Steps => "steps",
            GoalKind::Calories => "calories",
            GoalKind::Water => "water",
        };
        f.write_str(name)
    }
}

/// Inclusive bounds accepted when the user edits a goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalRange {
    pub min: u32,
    pub max: u32,
}

impl GoalRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Per-goal ranges. Missing entries in a config file fall back to the defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GoalRanges {
    pub weight: GoalRange,
    pub steps: GoalRange,
    pub calories: GoalRange,
    pub water: GoalRange,
}

impl Default for GoalRanges {
    fn default() -> Self {
        Self {
            weight: GoalRange::new(40, 150),
            steps: GoalRange::new(1000, 50000),
            calories: GoalRange::new(800, 5000),
            water: GoalRange::new(500, 5000),
        }
    }
}

impl GoalRanges {
    pub fn range(&self, kind: GoalKind) -> GoalRange {
        match kind {
            GoalKind::Weight => self.weight,
            GoalKind::Steps => self.steps,
            GoalKind::Calories => self.calories,
            GoalKind::Water => self.water,
        }
    }
}
