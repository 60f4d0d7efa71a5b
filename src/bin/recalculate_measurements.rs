//! Recompute every patient's current measurement snapshot
//! Usage: cargo run --bin recalculate_measurements
//!
//! Picks up profile changes (age, sex, activity level) made after the last
//! visit. Snapshot ids and timestamps are kept.

use nutrisys::calc::{SystemClock, UuidGenerator};
use nutrisys::config::Config;
use nutrisys::db::{migrations, Database};
use nutrisys::models::Patient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = Config::from_env().database_path;
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;
    database.with_conn(migrations::ensure_current)?;

    let conn = database.get_conn()?;
    let patients = Patient::list(&conn)?;
    println!("Found {} patients", patients.len());

    let mut updated = 0;
    for mut patient in patients {
        let Some(previous) = patient.recalculate_current(&UuidGenerator, &SystemClock)? else {
            println!("\n{}: no measurements, skipped", patient.full_name());
            continue;
        };
        patient.save(&conn)?;
        updated += 1;

        if let Some(current) = &patient.current_measurements {
            println!("\n{} ({})", patient.full_name(), current.timestamp);
            println!("  BMR:  {:.2} -> {:.2} kcal", previous.bmr_kcal, current.bmr_kcal);
            println!("  TDEE: {:.2} -> {:.2} kcal", previous.tdee_kcal, current.tdee_kcal);
            match (previous.body_fat_percent, current.body_fat_percent) {
                (Some(old), Some(new)) => println!("  Body fat: {:.2}% -> {:.2}%", old, new),
                (None, Some(new)) => println!("  Body fat: - -> {:.2}%", new),
                _ => {}
            }
        }
    }

    println!("\nRecalculated {} snapshots", updated);
    Ok(())
}
