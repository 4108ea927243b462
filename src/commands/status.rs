use clap::Args;
use dailyfit_core::{LedgerSnapshot, MealType, Session};

use super::{describe_remaining, OutputFormat};

#[derive(Args)]
pub struct StatusCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl StatusCommand {
    pub fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = session.ledger().snapshot();
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            OutputFormat::Text => print_snapshot(&snapshot, session.goals().calorie_goal()),
        }
        Ok(())
    }
}

fn print_snapshot(snapshot: &LedgerSnapshot, calorie_goal: u32) {
    println!("Day {}", snapshot.day);
    println!("==============\n");

    for meal_type in MealType::ALL {
        let meal = snapshot.meals.get(meal_type);
        println!(
            "{:<10} {:>6.0} kcal  {:>3}%  ({} items)",
            meal_type.as_str(),
            meal.total_calories(),
            meal.percentage(),
            meal.foods().len()
        );
    }
    println!();

    let totals = &snapshot.totals;
    if calorie_goal > 0 {
        println!(
            "Calories: {:.0} / {} kcal ({}%)",
            totals.total_calories, calorie_goal, totals.percentage
        );
    } else {
        println!("Calories: {:.0} kcal (no goal set)", totals.total_calories);
    }
    println!(
        "Fat {:.1}g  Carbs {:.1}g  Protein {:.1}g",
        totals.fat, totals.carbs, totals.protein
    );
    println!(
        "Water:    {} ml ({})",
        snapshot.water_intake,
        describe_remaining(snapshot.remaining_water, "ml")
    );
    println!(
        "Steps:    {} ({})",
        snapshot.steps_intake,
        describe_remaining(snapshot.remaining_steps, "steps")
    );
}
