use clap::{Args, Subcommand};
use dailyfit_core::{GoalKind, Goals, Session};

use super::OutputFormat;

#[derive(Args)]
pub struct GoalsCommand {
    #[command(subcommand)]
    pub command: GoalsSubcommand,
}

#[derive(Subcommand)]
pub enum GoalsSubcommand {
    /// Show cached goals and the allowed ranges
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Fetch goals from the server
    Fetch,

    /// Edit goals; omitted values keep their current setting
    Set {
        /// Target weight (kg)
        #[arg(long)]
        weight: Option<u32>,

        /// Daily steps
        #[arg(long)]
        steps: Option<u32>,

        /// Daily calories (kcal)
        #[arg(long)]
        calories: Option<u32>,

        /// Daily water (ml)
        #[arg(long)]
        water: Option<u32>,
    },
}

impl GoalsCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            GoalsSubcommand::Show { format } => self.show(session, format),
            GoalsSubcommand::Fetch => {
                let goals = session.fetch_goals().await?;
                println!("Fetched goals:");
                println!("{}", goals);
                Ok(())
            }
            GoalsSubcommand::Set {
                weight,
                steps,
                calories,
                water,
            } => {
                let current = session.goals().current();
                let pick = |value: &Option<u32>, kind: GoalKind| {
                    value
                        .or_else(|| current.map(|g| field(&g, kind)))
                        .ok_or_else(|| format!("No current {} goal; pass --{}", kind, kind))
                };
                let goals = Goals {
                    weight: pick(weight, GoalKind::Weight)?,
                    steps: pick(steps, GoalKind::Steps)?,
                    calories: pick(calories, GoalKind::Calories)?,
                    water: pick(water, GoalKind::Water)?,
                };

                session.save_goals(goals).await?;
                println!("Saved goals:");
                println!("{}", goals);
                Ok(())
            }
        }
    }

    fn show(
        &self,
        session: &Session,
        format: &OutputFormat,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let goals = session.goals().current();
        let ranges = session.goals().ranges();

        match format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "goals": goals, "ranges": ranges });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => {
                match goals {
                    Some(goals) => println!("{}", goals),
                    None => println!("No goals yet. Run 'dailyfit goals fetch'."),
                }
                println!();
                println!("Allowed ranges:");
                for kind in [
                    GoalKind::Weight,
                    GoalKind::Steps,
                    GoalKind::Calories,
                    GoalKind::Water,
                ] {
                    let range = ranges.range(kind);
                    println!("  {}: {}-{} {}", kind, range.min, range.max, kind.unit());
                }
            }
        }
        Ok(())
    }
}

fn field(goals: &Goals, kind: GoalKind) -> u32 {
    match kind {
        GoalKind::Weight => goals.weight,
        GoalKind::Steps => goals.steps,
        GoalKind::Calories => goals.calories,
        GoalKind::Water => goals.water,
    }
}
