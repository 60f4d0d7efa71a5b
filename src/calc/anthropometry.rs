//! Body size formulas
//!
//! BMI, ideal body weight (Devine), waist-hip ratio, lean mass and the
//! clinical BMI bands.

use serde::{Deserialize, Serialize};

use super::round_to;

/// Centimeters per inch
const CM_PER_INCH: f64 = 2.54;

/// Biological sex used to pick formula coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Some(Sex::Male),
            "female" | "f" | "woman" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Body mass index: weight over height in meters squared.
///
/// Height must be positive; `complete_snapshot` guarantees this before calling.
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 2)
}

/// Ideal body weight using the Devine formula.
///
/// Not clamped: very short statures produce small or negative values.
pub fn compute_ideal_body_weight(height_cm: f64, sex: Sex) -> f64 {
    let inches_over_60 = height_cm / CM_PER_INCH - 60.0;
    let base = match sex {
        Sex::Male => 50.0,
        Sex::Female => 45.5,
    };
    round_to(base + 2.3 * inches_over_60, 2)
}

/// Waist to hip ratio. `None` when hip is not positive.
pub fn compute_waist_hip_ratio(waist_cm: f64, hip_cm: f64) -> Option<f64> {
    if hip_cm <= 0.0 {
        return None;
    }
    Some(round_to(waist_cm / hip_cm, 2))
}

/// Lean mass: body weight minus estimated fat mass
pub fn compute_lean_mass(weight_kg: f64, body_fat_percent: f64) -> f64 {
    round_to(weight_kg * (1.0 - body_fat_percent / 100.0), 2)
}

/// Healthy body-fat percentage range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyFatRange {
    pub min: f64,
    pub max: f64,
}

pub fn ideal_body_fat_range(sex: Sex) -> BodyFatRange {
    match sex {
        Sex::Male => BodyFatRange { min: 10.0, max: 20.0 },
        Sex::Female => BodyFatRange { min: 18.0, max: 28.0 },
    }
}

/// Clinical BMI band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiStatus {
    Underweight,
    Normal,
    Overweight,
    ObesityClassI,
    ObesityClassII,
    ObesityClassIII,
}

impl BmiStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            BmiStatus::Underweight => "Underweight",
            BmiStatus::Normal => "Normal weight",
            BmiStatus::Overweight => "Overweight",
            BmiStatus::ObesityClassI => "Obesity class I",
            BmiStatus::ObesityClassII => "Obesity class II",
            BmiStatus::ObesityClassIII => "Obesity class III",
        }
    }
}

/// Presentation tag attached to each BMI band. Carries no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Ok,
    Caution,
    Warning,
    Danger,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmiClassification {
    pub status: BmiStatus,
    pub severity: Severity,
}

/// Classify a BMI value. Each band includes its lower bound.
pub fn classify_bmi(bmi: f64) -> BmiClassification {
    let (status, severity) = if bmi < 18.5 {
        (BmiStatus::Underweight, Severity::Info)
    } else if bmi < 25.0 {
        (BmiStatus::Normal, Severity::Ok)
    } else if bmi < 30.0 {
        (BmiStatus::Overweight, Severity::Caution)
    } else if bmi < 35.0 {
        (BmiStatus::ObesityClassI, Severity::Warning)
    } else if bmi < 40.0 {
        (BmiStatus::ObesityClassII, Severity::Danger)
    } else {
        (BmiStatus::ObesityClassIII, Severity::Critical)
    };

    BmiClassification { status, severity }
}
