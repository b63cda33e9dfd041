use std::path::Path;

use batlog_platform::{list_supplies, PowerSupply, POWER_SUPPLY_PATH};
use color_eyre::eyre::Result;

pub fn run(root: Option<&Path>) -> Result<()> {
    let root = root.unwrap_or_else(|| Path::new(POWER_SUPPLY_PATH));
    let supplies = list_supplies(root)?;

    println!("Power supplies in {}", root.display());
    println!("{}", "-".repeat(50));

    if supplies.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    println!("{:<16} {:<10} {}", "NAME", "TYPE", "USABLE AS");
    for supply in &supplies {
        println!(
            "{:<16} {:<10} {}",
            supply.name,
            supply.kind.label(),
            usable_as(supply)
        );
    }

    Ok(())
}

fn usable_as(supply: &PowerSupply) -> String {
    let mut roles = Vec::new();
    if supply.can_supply_charger() {
        roles.push("-c (current, voltage)");
    }
    if supply.can_supply_battery() {
        roles.push("-b (capacity)");
    }

    if roles.is_empty() {
        "-".to_string()
    } else {
        roles.join(", ")
    }
}
