//! Measurement snapshots
//!
//! `complete_snapshot` takes whatever measurements were entered for a visit
//! and fills in every field that can be derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    compute_bmi, compute_bmr, compute_body_fat_percentage, compute_ideal_body_weight,
    compute_lean_mass, compute_tdee, compute_waist_hip_ratio, ActivityLevel, CalcError,
    CalcResult, Sex, Skinfolds,
};

/// Timestamp format used for every stored record
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Source of unique record ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time formatted with [`TIMESTAMP_FORMAT`]
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Body circumferences in centimeters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circumferences {
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub neck: Option<f64>,
    pub arm: Option<f64>,
    pub thigh: Option<f64>,
    pub calf: Option<f64>,
    pub chest: Option<f64>,
}

/// Raw measurements as entered. Everything is optional here; weight and
/// height are checked by `complete_snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub circumferences: Circumferences,
    #[serde(default)]
    pub skinfolds: Skinfolds,
    /// Directly measured body fat, preferred over the Navy estimate
    pub body_fat_percent: Option<f64>,
    /// Directly measured lean mass, preferred over the estimate
    pub lean_mass_kg: Option<f64>,
    pub waist_hip_ratio: Option<f64>,
}

/// Derived values that were entered directly rather than computed. Kept on
/// the snapshot so a recompute holds them fixed and re-derives the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnteredValues {
    pub body_fat_percent: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub waist_hip_ratio: Option<f64>,
}

/// A complete point-in-time measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSnapshot {
    pub id: String,
    pub timestamp: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(default)]
    pub circumferences: Circumferences,
    #[serde(default)]
    pub skinfolds: Skinfolds,
    pub bmi: f64,
    pub ideal_weight_kg: f64,
    pub bmr_kcal: f64,
    pub tdee_kcal: f64,
    pub body_fat_percent: Option<f64>,
    pub lean_mass_kg: Option<f64>,
    pub waist_hip_ratio: Option<f64>,
    #[serde(default)]
    pub entered: EnteredValues,
}

impl From<&MeasurementSnapshot> for MeasurementInput {
    fn from(snapshot: &MeasurementSnapshot) -> Self {
        Self {
            id: Some(snapshot.id.clone()),
            timestamp: Some(snapshot.timestamp.clone()),
            weight_kg: Some(snapshot.weight_kg),
            height_cm: Some(snapshot.height_cm),
            circumferences: snapshot.circumferences.clone(),
            skinfolds: snapshot.skinfolds.clone(),
            body_fat_percent: snapshot.entered.body_fat_percent,
            lean_mass_kg: snapshot.entered.lean_mass_kg,
            waist_hip_ratio: snapshot.entered.waist_hip_ratio,
        }
    }
}

/// A zero reading counts as "not entered"
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// Supplied body fat wins; otherwise Navy estimate when waist and neck exist
fn derive_body_fat(input: &MeasurementInput, height_cm: f64, sex: Sex) -> Option<f64> {
    if let Some(supplied) = present(input.body_fat_percent) {
        return Some(supplied);
    }

    let c = &input.circumferences;
    match (present(c.waist), present(c.neck)) {
        (Some(waist), Some(neck)) => Some(compute_body_fat_percentage(
            height_cm,
            waist,
            neck,
            sex,
            present(c.hip),
        )),
        _ => None,
    }
}

/// Supplied lean mass wins; otherwise derived from a non-zero body fat
fn derive_lean_mass(
    input: &MeasurementInput,
    weight_kg: f64,
    body_fat_percent: Option<f64>,
) -> Option<f64> {
    if let Some(supplied) = present(input.lean_mass_kg) {
        return Some(supplied);
    }
    present(body_fat_percent).map(|bf| compute_lean_mass(weight_kg, bf))
}

/// Supplied ratio wins; otherwise waist over hip when both exist
fn derive_waist_hip_ratio(input: &MeasurementInput) -> Option<f64> {
    if let Some(supplied) = present(input.waist_hip_ratio) {
        return Some(supplied);
    }

    let c = &input.circumferences;
    match (present(c.waist), present(c.hip)) {
        (Some(waist), Some(hip)) => compute_waist_hip_ratio(waist, hip),
        _ => None,
    }
}

/// Fill in every derivable field of a measurement set.
///
/// Fails before computing anything when weight or height is missing. An
/// existing id and timestamp are kept, so recomputing a stored snapshot
/// returns it unchanged.
pub fn complete_snapshot(
    input: &MeasurementInput,
    age_years: u32,
    sex: Sex,
    activity_level: ActivityLevel,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> CalcResult<MeasurementSnapshot> {
    let weight_kg =
        present(input.weight_kg).ok_or(CalcError::MissingRequiredField("weight_kg"))?;
    let height_cm =
        present(input.height_cm).ok_or(CalcError::MissingRequiredField("height_cm"))?;

    let bmi = compute_bmi(weight_kg, height_cm);
    let ideal_weight_kg = compute_ideal_body_weight(height_cm, sex);
    let bmr_kcal = compute_bmr(weight_kg, height_cm, f64::from(age_years), sex);
    let tdee_kcal = compute_tdee(bmr_kcal, activity_level);

    let body_fat_percent = derive_body_fat(input, height_cm, sex);
    let lean_mass_kg = derive_lean_mass(input, weight_kg, body_fat_percent);
    let waist_hip_ratio = derive_waist_hip_ratio(input);

    let id = match input.id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ids.next_id(),
    };
    let timestamp = match input.timestamp.as_deref() {
        Some(ts) if !ts.is_empty() => ts.to_string(),
        _ => clock.timestamp(),
    };

    Ok(MeasurementSnapshot {
        id,
        timestamp,
        weight_kg,
        height_cm,
        circumferences: input.circumferences.clone(),
        skinfolds: input.skinfolds.clone(),
        bmi,
        ideal_weight_kg,
        bmr_kcal,
        tdee_kcal,
        body_fat_percent,
        lean_mass_kg,
        waist_hip_ratio,
        entered: EnteredValues {
            body_fat_percent: present(input.body_fat_percent),
            lean_mass_kg: present(input.lean_mass_kg),
            waist_hip_ratio: present(input.waist_hip_ratio),
        },
    })
}
