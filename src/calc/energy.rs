//! Energy expenditure
//!
//! Basal metabolic rate (revised Harris-Benedict) and total daily energy
//! expenditure from a fixed activity multiplier table.

use serde::{Deserialize, Serialize};

use super::{round_to, CalcError, CalcResult, Sex};

/// Habitual activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(|c: char| c == '-' || c == ' ', "_").as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" | "lightly_active" => Some(ActivityLevel::Light),
            "moderate" | "moderately_active" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }

    /// Parse a label, failing on anything outside the five known levels.
    /// There is no default level.
    pub fn parse(s: &str) -> CalcResult<Self> {
        Self::from_str(s).ok_or_else(|| CalcError::InvalidEnumValue {
            field: "activity_level",
            value: s.to_string(),
        })
    }

    /// TDEE multiplier for this level
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Basal metabolic rate in kcal/day
pub fn compute_bmr(weight_kg: f64, height_cm: f64, age_years: f64, sex: Sex) -> f64 {
    let bmr = match sex {
        Sex::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age_years,
        Sex::Female => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age_years,
    };
    round_to(bmr, 2)
}

/// Total daily energy expenditure in kcal/day
pub fn compute_tdee(bmr: f64, activity_level: ActivityLevel) -> f64 {
    round_to(bmr * activity_level.multiplier(), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmr_male_reference() {
        let bmr = compute_bmr(70.0, 175.0, 30.0, Sex::Male);
        assert!((bmr - 1695.67).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_female() {
        let bmr = compute_bmr(60.0, 165.0, 28.0, Sex::Female);
        assert!((bmr - 1392.34).abs() < 1e-9);
    }

    #[test]
    fn test_tdee_moderate() {
        let tdee = compute_tdee(1695.67, ActivityLevel::Moderate);
        assert!((tdee - 2628.29).abs() < 0.011);
    }

    #[test]
    fn test_tdee_multipliers() {
        assert_eq!(compute_tdee(1000.0, ActivityLevel::Sedentary), 1200.0);
        assert_eq!(compute_tdee(1000.0, ActivityLevel::Light), 1375.0);
        assert_eq!(compute_tdee(1000.0, ActivityLevel::Moderate), 1550.0);
        assert_eq!(compute_tdee(1000.0, ActivityLevel::Active), 1725.0);
        assert_eq!(compute_tdee(1000.0, ActivityLevel::VeryActive), 1900.0);
    }

    #[test]
    fn test_activity_level_parse() {
        assert_eq!(ActivityLevel::parse("moderate"), Ok(ActivityLevel::Moderate));
        assert_eq!(ActivityLevel::parse("Very-Active"), Ok(ActivityLevel::VeryActive));
        assert_eq!(ActivityLevel::parse("lightly active"), Ok(ActivityLevel::Light));
    }

    #[test]
    fn test_activity_level_rejects_unknown() {
        // No fallback level, unlike goal lookups
        let err = ActivityLevel::parse("extreme").unwrap_err();
        assert_eq!(
            err,
            CalcError::InvalidEnumValue {
                field: "activity_level",
                value: "extreme".to_string(),
            }
        );
        assert!(ActivityLevel::parse("").is_err());
    }

    #[test]
    fn test_activity_level_round_trip_labels() {
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ] {
            assert_eq!(ActivityLevel::from_str(level.as_str()), Some(level));
        }
    }
}
