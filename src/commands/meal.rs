use clap::{Args, Subcommand};
use dailyfit_core::{FoodEntry, Meal, MealType, Session};

use super::OutputFormat;

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Add a food to a meal
    Add {
        /// Meal type (breakfast, lunch, dinner, snack)
        meal_type: String,

        /// Food name
        #[arg(long, required_unless_present = "from_catalog", conflicts_with = "from_catalog")]
        name: Option<String>,

        /// Calories per unit
        #[arg(long, required_unless_present = "from_catalog", conflicts_with = "from_catalog")]
        calories: Option<f64>,

        /// Take the food from the catalog instead (exact name match, else the first hit)
        #[arg(long, value_name = "QUERY")]
        from_catalog: Option<String>,

        /// Fat per unit (g)
        #[arg(long, default_value_t = 0.0)]
        fat: f64,

        /// Carbohydrates per unit (g)
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,

        /// Protein per unit (g)
        #[arg(long, default_value_t = 0.0)]
        protein: f64,

        /// Number of units
        #[arg(long, short, default_value_t = 1)]
        quantity: u32,
    },

    /// Change the quantity of a food by a signed delta (never below 1)
    Qty {
        /// Meal type (breakfast, lunch, dinner, snack)
        meal_type: String,

        /// Food ID
        food_id: String,

        /// Amount to add, e.g. 1 or -1
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Remove a food from a meal
    Remove {
        /// Meal type (breakfast, lunch, dinner, snack)
        meal_type: String,

        /// Food ID
        food_id: String,
    },

    /// Search the food catalog
    Search {
        /// Part of a food name
        query: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a meal with its foods and totals
    Show {
        /// Meal type (breakfast, lunch, dinner, snack)
        meal_type: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl MealCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MealSubcommand::Add {
                meal_type,
                name,
                calories,
                fat,
                carbs,
                protein,
                from_catalog,
                quantity,
            } => {
                let meal_type = parse_meal_type(meal_type)?;
                if *quantity == 0 {
                    return Err("Quantity must be at least 1".into());
                }
                let food = match (from_catalog, name, calories) {
                    (Some(query), _, _) => {
                        let results = session.search_foods(query).await?;
                        pick_catalog_match(results, query)
                            .ok_or_else(|| format!("No catalog food matches '{}'", query))?
                    }
                    (None, Some(name), Some(calories)) => {
                        FoodEntry::new(name.as_str(), *calories).with_macros(*fat, *carbs, *protein)
                    }
                    _ => {
                        return Err("Either --from-catalog or --name and --calories is required".into())
                    }
                }
                .with_quantity(*quantity);
                let added = food.name.clone();
                let meal = session.ledger_mut().add_meal(meal_type, vec![food]);

                println!("Added {} to {}:", added, meal_type);
                print_meal(&meal);
            }
            MealSubcommand::Qty {
                meal_type,
                food_id,
                delta,
            } => {
                let meal_type = parse_meal_type(meal_type)?;
                require_food(session, meal_type, food_id)?;
                let meal = session
                    .ledger_mut()
                    .change_food_quantity(meal_type, food_id, *delta);

                println!("Updated {}:", meal_type);
                print_meal(&meal);
            }
            MealSubcommand::Remove { meal_type, food_id } => {
                let meal_type = parse_meal_type(meal_type)?;
                require_food(session, meal_type, food_id)?;
                let meal = session.ledger_mut().remove_food(meal_type, food_id);

                println!("Removed food from {}:", meal_type);
                print_meal(&meal);
            }
            MealSubcommand::Search { query, format } => {
                let foods = session.search_foods(query).await?;
                if foods.is_empty() {
                    println!("No foods found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&foods)?),
                    OutputFormat::Text => {
                        println!(
                            "{:<12}  {:<30}  {:>8}  {:>7}  {:>7}  {:>7}",
                            "ID", "NAME", "KCAL", "FAT", "CARBS", "PROTEIN"
                        );
                        println!("{}", "-".repeat(82));
                        for food in &foods {
                            println!(
                                "{:<12}  {:<30}  {:>8.0}  {:>7.1}  {:>7.1}  {:>7.1}",
                                truncate(&food.id, 12),
                                truncate(&food.name, 30),
                                food.calories_per_unit,
                                food.fat_per_unit,
                                food.carbs_per_unit,
                                food.protein_per_unit
                            );
                        }
                        println!("\nTotal: {} food(s)", foods.len());
                    }
                }
            }
            MealSubcommand::Show { meal_type, format } => {
                let meal_type = parse_meal_type(meal_type)?;
                let meal = session.ledger().meal(meal_type);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&meal)?),
                    OutputFormat::Text => {
                        println!("{} ({})", meal_type, session.ledger().day());
                        print_meal(&meal);
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_meal_type(input: &str) -> Result<MealType, Box<dyn std::error::Error>> {
    Ok(input.parse().map_err(|e: String| e)?)
}

/// The ledger ignores unknown ids; the CLI reports them instead.
fn require_food(
    session: &Session,
    meal_type: MealType,
    food_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if session.ledger().meal(meal_type).food(food_id).is_none() {
        return Err(format!("Food not found in {}: {}", meal_type, food_id).into());
    }
    Ok(())
}

/// Prefers a case-insensitive exact name match, then the first result.
fn pick_catalog_match(foods: Vec<FoodEntry>, query: &str) -> Option<FoodEntry> {
    let wanted = query.trim().to_lowercase();
    let exact = foods.iter().position(|f| f.name.to_lowercase() == wanted);
    foods.into_iter().nth(exact.unwrap_or(0))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn print_meal(meal: &Meal) {
    if meal.is_empty() {
        println!("  (empty)");
    } else {
        print!("{}", meal);
    }
}
