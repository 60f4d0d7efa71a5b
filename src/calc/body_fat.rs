//! Body-fat percentage estimation
//!
//! Two methods are offered:
//! - US Navy circumference method (height, waist, neck, and hip for women)
//! - Jackson-Pollock 3-site skinfold method
//!
//! Both clamp the result at zero and round to 2 decimals.

use serde::{Deserialize, Serialize};

use super::{round_to, Sex};

/// Skinfold thickness readings in millimeters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skinfolds {
    pub triceps: Option<f64>,
    pub subscapular: Option<f64>,
    pub suprailiac: Option<f64>,
    pub abdominal: Option<f64>,
    pub thigh: Option<f64>,
    pub calf: Option<f64>,
    /// Rarely recorded; only the male 3-site sum reads it
    pub chest: Option<f64>,
}

impl Skinfolds {
    /// Sum of the three Jackson-Pollock sites for the given sex.
    /// Missing sites count as zero.
    pub fn three_site_sum(&self, sex: Sex) -> f64 {
        let sites = match sex {
            Sex::Male => [self.chest, self.abdominal, self.thigh],
            Sex::Female => [self.triceps, self.suprailiac, self.thigh],
        };
        sites.iter().map(|s| s.unwrap_or(0.0)).sum()
    }
}

/// Convert body density to body-fat percentage (Siri), clamped at zero
fn siri_percentage(density: f64) -> f64 {
    round_to((495.0 / density - 450.0).max(0.0), 2)
}

/// Body-fat percentage using the US Navy circumference formula.
///
/// Women need a hip circumference; without one the result is `0.0`. A
/// girth term that is not positive (waist at or below neck for men, waist
/// plus hip at or below neck for women) also gives `0.0`.
pub fn compute_body_fat_percentage(
    height_cm: f64,
    waist_cm: f64,
    neck_cm: f64,
    sex: Sex,
    hip_cm: Option<f64>,
) -> f64 {
    let (girth, base, girth_factor, height_factor) = match sex {
        Sex::Male => (waist_cm - neck_cm, 1.0324, 0.19077, 0.15456),
        Sex::Female => {
            let Some(hip_cm) = hip_cm.filter(|h| *h != 0.0) else {
                return 0.0;
            };
            (waist_cm + hip_cm - neck_cm, 1.29579, 0.35004, 0.22100)
        }
    };
    if !girth.is_finite() || girth <= 0.0 {
        return 0.0;
    }

    let density = base - girth_factor * girth.log10() + height_factor * height_cm.log10();
    siri_percentage(density)
}

/// Body-fat percentage from 3-site skinfolds (Jackson-Pollock)
pub fn compute_body_fat_from_skinfolds(skinfolds: &Skinfolds, age_years: f64, sex: Sex) -> f64 {
    let sum = skinfolds.three_site_sum(sex);
    if sum == 0.0 {
        return 0.0;
    }

    let density = match sex {
        Sex::Male => 1.10938 - 0.0008267 * sum + 0.0000016 * sum * sum - 0.0002574 * age_years,
        Sex::Female => {
            1.0994921 - 0.0009929 * sum + 0.0000023 * sum * sum - 0.0001392 * age_years
        }
    };
    siri_percentage(density)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navy_male() {
        let bf = compute_body_fat_percentage(175.0, 85.0, 38.0, Sex::Male, None);
        assert_eq!(bf, 16.94);
    }

    #[test]
    fn test_navy_male_ignores_hip() {
        let with_hip = compute_body_fat_percentage(175.0, 85.0, 38.0, Sex::Male, Some(99.0));
        let without = compute_body_fat_percentage(175.0, 85.0, 38.0, Sex::Male, None);
        assert_eq!(with_hip, without);
    }

    #[test]
    fn test_navy_female() {
        let bf = compute_body_fat_percentage(165.0, 80.0, 34.0, Sex::Female, Some(100.0));
        assert_eq!(bf, 31.4);
    }

    #[test]
    fn test_navy_female_without_hip_is_zero() {
        let bf = compute_body_fat_percentage(165.0, 80.0, 34.0, Sex::Female, None);
        assert_eq!(bf, 0.0);
    }

    #[test]
    fn test_navy_clamped_at_zero() {
        // Tiny waist-neck difference drives the formula negative
        let bf = compute_body_fat_percentage(190.0, 40.0, 38.0, Sex::Male, None);
        assert_eq!(bf, 0.0);
    }

    #[test]
    fn test_navy_non_positive_girth_is_zero() {
        for (waist, neck) in [(38.0, 38.0), (36.0, 38.0)] {
            let bf = compute_body_fat_percentage(175.0, waist, neck, Sex::Male, None);
            assert_eq!(bf, 0.0);
        }

        let equal = compute_body_fat_percentage(165.0, 20.0, 50.0, Sex::Female, Some(30.0));
        assert_eq!(equal, 0.0);
        let below = compute_body_fat_percentage(165.0, 10.0, 50.0, Sex::Female, Some(30.0));
        assert_eq!(below, 0.0);
        assert!(!below.is_nan());
    }

    #[test]
    fn test_skinfolds_male() {
        let folds = Skinfolds {
            chest: Some(10.0),
            abdominal: Some(20.0),
            thigh: Some(15.0),
            ..Default::default()
        };
        let bf = compute_body_fat_from_skinfolds(&folds, 30.0, Sex::Male);
        assert_eq!(bf, 13.61);
    }

    #[test]
    fn test_skinfolds_male_without_chest() {
        let folds = Skinfolds {
            abdominal: Some(20.0),
            thigh: Some(15.0),
            triceps: Some(12.0),
            ..Default::default()
        };
        assert_eq!(folds.three_site_sum(Sex::Male), 35.0);
        assert!(compute_body_fat_from_skinfolds(&folds, 30.0, Sex::Male) > 0.0);
    }

    #[test]
    fn test_skinfolds_female() {
        let folds = Skinfolds {
            triceps: Some(15.0),
            suprailiac: Some(18.0),
            thigh: Some(20.0),
            ..Default::default()
        };
        let bf = compute_body_fat_from_skinfolds(&folds, 28.0, Sex::Female);
        assert_eq!(bf, 21.68);
    }

    #[test]
    fn test_skinfolds_zero_sum() {
        let folds = Skinfolds {
            subscapular: Some(12.0),
            calf: Some(9.0),
            ..Default::default()
        };
        assert_eq!(compute_body_fat_from_skinfolds(&folds, 40.0, Sex::Female), 0.0);
        assert_eq!(compute_body_fat_from_skinfolds(&Skinfolds::default(), 40.0, Sex::Male), 0.0);
    }
}
