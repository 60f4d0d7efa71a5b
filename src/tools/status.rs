//! Nutrisys Status Tool
//!
//! Runtime status of the service plus the usage guides served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Consultation workflow guide for AI assistants
pub const CONSULTATION_INSTRUCTIONS: &str = r#"
# Nutrisys Consultation Workflow

Nutrisys keeps patient records for a nutrition practice. Every saved visit
produces a measurement snapshot with the derived values already computed.

## A first visit

1. `save_patient` with no `id`. Required: first_name, last_name, sex, age,
   activity_level, weight_kg, height_cm. Everything else is optional.
2. Read the returned `snapshot`: BMI, ideal weight, BMR and TDEE are always
   present. Body fat, lean mass and waist/hip ratio appear when the inputs
   allow them (see the measurement guide).
3. `patient_summary` gives the BMI band, the ideal body fat range, the daily
   calorie target and macro split for the patient's goal.

## Follow-up visits

1. `save_patient` with the patient's `id` and the new measurements. The new
   snapshot becomes current and is appended to the history. Notes and plan
   assignments stay as they were.
2. `add_consultation_note` for what was discussed. Weight defaults to the
   current measurement.
3. `measurement_history` for the full trend.

## Plans

- Diets: `create_diet`, then `add_diet_meal` per food line. Quantities are in
  grams; nutrition is scaled from the food's standard portion. Macro
  percentages must total 100. When omitted they follow the diet's goal.
- Routines: `create_routine`, then `add_routine_exercise`. Cardio exercises
  keep only the duration; other kinds keep sets and reps.
- `assign_diet` / `assign_routine` link a plan to a patient. Pass no plan id
  to clear the assignment.
- Foods used by a diet and exercises used by a routine cannot be deleted.
  Deleting a diet or routine clears it from every patient.

## Labels

| Field | Values |
|-------|--------|
| sex | male, female |
| activity_level | sedentary, light, moderate, active, very_active |
| goal | reduce_weight, gain_weight, cut_define, gain_muscle, maintain, cardiovascular |
| food category | protein, carbohydrate, fat, vegetable, fruit, dairy, beverage, other |
| exercise kind | cardio, strength, flexibility, functional |
| level | beginner, intermediate, advanced |

Unknown labels are rejected, except by `goal_targets`, which answers an
unknown goal with the maintenance targets.
"#;

/// Measurement protocol guide for AI assistants
pub const MEASUREMENT_INSTRUCTIONS: &str = r#"
# Nutrisys Measurement Guide

All lengths in centimetres, skinfolds in millimetres, weight in kilograms.
A value of 0 counts as not measured.

## Derived values

| Value | Formula | Needs |
|-------|---------|-------|
| BMI | weight / height(m)^2, 2 dp | weight, height |
| Ideal weight | Devine: 50 kg (men) / 45.5 kg (women) + 2.3 kg per inch over 5 ft | height, sex |
| BMR | revised Harris-Benedict | weight, height, age, sex |
| TDEE | BMR x activity multiplier (1.2 / 1.375 / 1.55 / 1.725 / 1.9) | activity level |
| Body fat % | US Navy circumference method | waist, neck, height (women: hip too) |
| Lean mass | weight x (1 - body fat %) | body fat % |
| Waist/hip | waist / hip | waist, hip |

A body fat %, lean mass or waist/hip value entered directly is kept as is.

## Skinfolds

`body_fat_from_skinfolds` uses the Jackson-Pollock 3-site equations:

- Men: chest, abdominal, thigh
- Women: triceps, suprailiac, thigh

Body density is converted with the Siri equation.

## BMI bands

| BMI | Band |
|-----|------|
| < 18.5 | Underweight |
| 18.5 - 24.9 | Normal weight |
| 25 - 29.9 | Overweight |
| 30 - 34.9 | Obesity class I |
| 35 - 39.9 | Obesity class II |
| >= 40 | Obesity class III |
"#;

/// Runtime status of the Nutrisys service
#[derive(Debug, Clone, Serialize)]
pub struct NutrisysStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Current status. `schema_version` is read by the caller, which owns
    /// the database handle.
    pub fn get_status(&self, schema_version: Option<i32>) -> NutrisysStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutrisysStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
