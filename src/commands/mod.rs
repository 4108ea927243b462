mod activity;
mod config_cmd;
mod goals;
mod meal;
mod status;

use clap::ValueEnum;

pub use activity::{StepsCommand, WaterCommand};
pub use config_cmd::ConfigCommand;
pub use goals::GoalsCommand;
pub use meal::MealCommand;
pub use status::StatusCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Describes a signed remaining amount, e.g. "1500 ml to go".
pub fn describe_remaining(remaining: i64, unit: &str) -> String {
    if remaining >= 0 {
        format!("{} {} to go", remaining, unit)
    } else {
        format!("goal exceeded by {} {}", remaining.unsigned_abs(), unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_remaining() {
        assert_eq!(describe_remaining(1500, "ml"), "1500 ml to go");
        assert_eq!(describe_remaining(0, "steps"), "0 steps to go");
        assert_eq!(describe_remaining(-250, "ml"), "goal exceeded by 250 ml");
    }
}
