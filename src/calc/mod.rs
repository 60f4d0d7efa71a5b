//! Anthropometric and nutritional calculations
//!
//! Pure formula library used whenever a patient's measurements, age, sex or
//! activity level change. Nothing in here touches the database.

pub mod anthropometry;
pub mod body_fat;
pub mod energy;
pub mod goals;
pub mod snapshot;

use thiserror::Error;

pub use anthropometry::{
    classify_bmi, compute_bmi, compute_ideal_body_weight, compute_lean_mass,
    compute_waist_hip_ratio, ideal_body_fat_range, BmiClassification, BmiStatus, BodyFatRange,
    Severity, Sex,
};
pub use body_fat::{compute_body_fat_from_skinfolds, compute_body_fat_percentage, Skinfolds};
pub use energy::{compute_bmr, compute_tdee, ActivityLevel};
pub use goals::{calorie_target_for_goal, macro_distribution_for_goal, Goal, MacroDistribution};
pub use snapshot::{
    complete_snapshot, Circumferences, Clock, EnteredValues, IdGenerator, MeasurementInput,
    MeasurementSnapshot, SystemClock, UuidGenerator, TIMESTAMP_FORMAT,
};

/// Calculator error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid value '{value}' for {field}")]
    InvalidEnumValue { field: &'static str, value: String },
}

/// Result type for calculator operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Round half away from zero to the given number of decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_two_places() {
        assert_eq!(round_to(22.857142, 2), 22.86);
        assert_eq!(round_to(1695.667, 2), 1695.67);
        assert_eq!(round_to(-0.004, 2), -0.0);
    }

    #[test]
    fn test_round_to_zero_places() {
        assert_eq!(round_to(1599.5, 0), 1600.0);
        assert_eq!(round_to(2102.632, 0), 2103.0);
    }

    #[test]
    fn test_error_messages() {
        let err = CalcError::MissingRequiredField("weight_kg");
        assert_eq!(err.to_string(), "Missing required field: weight_kg");

        let err = CalcError::InvalidEnumValue {
            field: "activity_level",
            value: "couch".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value 'couch' for activity_level");
    }
}
