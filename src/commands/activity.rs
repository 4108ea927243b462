use clap::Args;
use dailyfit_core::Session;

use super::describe_remaining;

#[derive(Args)]
pub struct WaterCommand {
    /// Millilitres of water to add (whole number)
    pub amount: String,
}

impl WaterCommand {
    pub fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        let remaining = session.ledger_mut().add_water(&self.amount)?;
        println!(
            "Water today: {} ml ({})",
            session.ledger().water_intake(),
            describe_remaining(remaining, "ml")
        );
        Ok(())
    }
}

#[derive(Args)]
pub struct StepsCommand {
    /// Steps to add (whole number)
    pub amount: String,
}

impl StepsCommand {
    pub fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        let remaining = session.ledger_mut().add_steps(&self.amount)?;
        println!(
            "Steps today: {} ({})",
            session.ledger().steps_intake(),
            describe_remaining(remaining, "steps")
        );
        Ok(())
    }
}
