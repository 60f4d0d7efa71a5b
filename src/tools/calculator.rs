//! Calculator Tools
//!
//! Stateless calculations exposed without touching patient records.

use serde::Serialize;

use crate::calc::{
    self, calorie_target_for_goal, complete_snapshot, compute_body_fat_from_skinfolds,
    ideal_body_fat_range, macro_distribution_for_goal, ActivityLevel, BmiStatus, BodyFatRange,
    Clock, Goal, IdGenerator, MacroDistribution, MeasurementInput, MeasurementSnapshot, Severity,
    Sex, Skinfolds,
};

/// kcal per gram of protein and carbohydrate
const KCAL_PER_G_PROTEIN_CARB: f64 = 4.0;
/// kcal per gram of fat
const KCAL_PER_G_FAT: f64 = 9.0;

pub(crate) fn parse_sex(label: &str) -> Result<Sex, String> {
    Sex::from_str(label).ok_or_else(|| format!("Invalid sex '{}': expected male or female", label))
}

pub(crate) fn parse_activity_level(label: &str) -> Result<ActivityLevel, String> {
    ActivityLevel::parse(label).map_err(|e| {
        format!("{} (expected sedentary, light, moderate, active or very_active)", e)
    })
}

/// Strict goal parsing for stored records. An absent or blank label is `None`.
pub(crate) fn parse_goal(label: Option<&str>) -> Result<Option<Goal>, String> {
    match label.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(label) => Goal::from_str(label)
            .map(Some)
            .ok_or_else(|| format!("Invalid goal '{}'", label)),
    }
}

/// Reject negative or non-finite weight and height. Absent and zero values
/// are left for `complete_snapshot` to report as missing.
pub(crate) fn check_body_size(input: &MeasurementInput) -> Result<(), String> {
    for (field, value) in [("weight_kg", input.weight_kg), ("height_cm", input.height_cm)] {
        if let Some(v) = value.filter(|v| *v != 0.0) {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{} must be a positive number", field));
            }
        }
    }
    Ok(())
}

/// BMI classification with its display label
#[derive(Debug, Serialize)]
pub struct BmiClassificationResponse {
    pub bmi: f64,
    pub status: BmiStatus,
    pub label: &'static str,
    pub severity: Severity,
}

impl BmiClassificationResponse {
    pub fn for_bmi(bmi: f64) -> Self {
        let c = calc::classify_bmi(bmi);
        Self {
            bmi,
            status: c.status,
            label: c.status.display_name(),
            severity: c.severity,
        }
    }
}

/// Response for calculate_measurements
#[derive(Debug, Serialize)]
pub struct CalculateMeasurementsResponse {
    pub snapshot: MeasurementSnapshot,
    pub bmi_classification: BmiClassificationResponse,
    pub ideal_body_fat_range: BodyFatRange,
    /// Jackson-Pollock estimate, when skinfolds were entered
    pub skinfold_body_fat_percent: Option<f64>,
}

/// Response for goal_targets
#[derive(Debug, Serialize)]
pub struct GoalTargetsResponse {
    pub goal: Option<Goal>,
    /// False when the label was not a known goal and maintenance was used
    pub goal_recognized: bool,
    pub tdee_kcal: f64,
    pub calorie_target: i64,
    pub macros: MacroDistribution,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Response for body_fat_from_skinfolds
#[derive(Debug, Serialize)]
pub struct SkinfoldBodyFatResponse {
    pub body_fat_percent: f64,
    pub site_sum_mm: f64,
    pub ideal_body_fat_range: BodyFatRange,
}

/// Complete a measurement set without saving it
pub fn calculate_measurements(
    input: MeasurementInput,
    age: u32,
    sex: &str,
    activity_level: &str,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<CalculateMeasurementsResponse, String> {
    let sex = parse_sex(sex)?;
    let activity_level = parse_activity_level(activity_level)?;
    check_body_size(&input)?;

    let snapshot = complete_snapshot(&input, age, sex, activity_level, ids, clock)
        .map_err(|e| e.to_string())?;

    let skinfold_body_fat_percent = if input.skinfolds.three_site_sum(sex) > 0.0 {
        Some(compute_body_fat_from_skinfolds(&input.skinfolds, f64::from(age), sex))
    } else {
        None
    };

    Ok(CalculateMeasurementsResponse {
        bmi_classification: BmiClassificationResponse::for_bmi(snapshot.bmi),
        ideal_body_fat_range: ideal_body_fat_range(sex),
        skinfold_body_fat_percent,
        snapshot,
    })
}

/// Classify a BMI value into its clinical band
pub fn classify_bmi(bmi: f64) -> Result<BmiClassificationResponse, String> {
    if !bmi.is_finite() || bmi <= 0.0 {
        return Err("bmi must be a positive number".to_string());
    }
    Ok(BmiClassificationResponse::for_bmi(bmi))
}

/// Calorie target and macro split for a goal label.
///
/// Unknown labels are answered with the maintenance targets.
pub fn goal_targets(tdee: f64, goal: &str) -> Result<GoalTargetsResponse, String> {
    if !tdee.is_finite() || tdee <= 0.0 {
        return Err("tdee must be a positive number".to_string());
    }

    let parsed = Goal::from_str(goal);
    if parsed.is_none() {
        tracing::debug!("Unrecognized goal '{}', using maintenance targets", goal);
    }

    let calorie_target = calorie_target_for_goal(tdee, parsed);
    let macros = macro_distribution_for_goal(parsed);
    let grams = |percent: u8, kcal_per_g: f64| {
        calc::round_to(calorie_target as f64 * f64::from(percent) / 100.0 / kcal_per_g, 1)
    };

    Ok(GoalTargetsResponse {
        goal: parsed,
        goal_recognized: parsed.is_some(),
        tdee_kcal: tdee,
        calorie_target,
        protein_g: grams(macros.protein, KCAL_PER_G_PROTEIN_CARB),
        carbs_g: grams(macros.carbs, KCAL_PER_G_PROTEIN_CARB),
        fat_g: grams(macros.fat, KCAL_PER_G_FAT),
        macros,
    })
}

/// Jackson-Pollock 3-site body fat
pub fn body_fat_from_skinfolds(
    skinfolds: Skinfolds,
    age: u32,
    sex: &str,
) -> Result<SkinfoldBodyFatResponse, String> {
    let sex = parse_sex(sex)?;
    let site_sum_mm = skinfolds.three_site_sum(sex);
    if site_sum_mm <= 0.0 {
        let sites = match sex {
            Sex::Male => "chest, abdominal and thigh",
            Sex::Female => "triceps, suprailiac and thigh",
        };
        return Err(format!("No skinfold readings for the {} sites", sites));
    }

    Ok(SkinfoldBodyFatResponse {
        body_fat_percent: compute_body_fat_from_skinfolds(&skinfolds, f64::from(age), sex),
        site_sum_mm,
        ideal_body_fat_range: ideal_body_fat_range(sex),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClock, SequentialIds};

    #[test]
    fn test_calculate_measurements_reference() {
        let input = MeasurementInput {
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
            ..Default::default()
        };
        let result = calculate_measurements(
            input,
            30,
            "male",
            "moderate",
            &SequentialIds::new("m"),
            &FixedClock::default(),
        )
        .unwrap();

        assert_eq!(result.snapshot.bmi, 22.86);
        assert_eq!(result.bmi_classification.status, BmiStatus::Normal);
        assert_eq!(result.ideal_body_fat_range.min, 10.0);
        assert_eq!(result.skinfold_body_fat_percent, None);
    }

    #[test]
    fn test_calculate_measurements_rejects_unknown_activity() {
        let input = MeasurementInput {
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
            ..Default::default()
        };
        let err = calculate_measurements(
            input,
            30,
            "male",
            "extreme",
            &SequentialIds::new("m"),
            &FixedClock::default(),
        )
        .unwrap_err();
        assert!(err.contains("Invalid value 'extreme' for activity_level"));
    }

    #[test]
    fn test_calculate_measurements_rejects_negative_size() {
        for (weight, height, field) in [
            (70.0, -175.0, "height_cm"),
            (-70.0, 175.0, "weight_kg"),
            (f64::NAN, 175.0, "weight_kg"),
        ] {
            let input = MeasurementInput {
                weight_kg: Some(weight),
                height_cm: Some(height),
                ..Default::default()
            };
            let err = calculate_measurements(
                input,
                30,
                "male",
                "moderate",
                &SequentialIds::new("m"),
                &FixedClock::default(),
            )
            .unwrap_err();
            assert_eq!(err, format!("{} must be a positive number", field));
        }
    }

    #[test]
    fn test_calculate_measurements_missing_height() {
        let input = MeasurementInput {
            weight_kg: Some(70.0),
            ..Default::default()
        };
        let err = calculate_measurements(
            input,
            30,
            "female",
            "light",
            &SequentialIds::new("m"),
            &FixedClock::default(),
        )
        .unwrap_err();
        assert_eq!(err, "Missing required field: height_cm");
    }

    #[test]
    fn test_goal_targets_reduce_weight() {
        let result = goal_targets(2000.0, "reduce_weight").unwrap();
        assert!(result.goal_recognized);
        assert_eq!(result.calorie_target, 1600);
        assert_eq!(result.macros, MacroDistribution { protein: 35, carbs: 35, fat: 30 });
        assert_eq!(result.protein_g, 140.0);
        assert_eq!(result.fat_g, 53.3);
    }

    #[test]
    fn test_goal_targets_unknown_goal_defaults() {
        let result = goal_targets(2000.0, "bulk").unwrap();
        assert!(!result.goal_recognized);
        assert_eq!(result.goal, None);
        assert_eq!(result.calorie_target, 2000);
        assert_eq!(result.macros, MacroDistribution::default());
    }

    #[test]
    fn test_classify_bmi_tool() {
        let r = classify_bmi(25.0).unwrap();
        assert_eq!(r.status, BmiStatus::Overweight);
        assert_eq!(r.label, "Overweight");
        assert!(classify_bmi(f64::NAN).is_err());
    }

    #[test]
    fn test_skinfold_tool() {
        let folds = Skinfolds {
            triceps: Some(15.0),
            suprailiac: Some(18.0),
            thigh: Some(20.0),
            ..Default::default()
        };
        let r = body_fat_from_skinfolds(folds, 28, "female").unwrap();
        assert_eq!(r.body_fat_percent, 21.68);
        assert_eq!(r.site_sum_mm, 53.0);

        assert!(body_fat_from_skinfolds(Skinfolds::default(), 28, "female").is_err());
    }

    #[test]
    fn test_parse_goal_strict() {
        assert_eq!(parse_goal(None), Ok(None));
        assert_eq!(parse_goal(Some(" ")), Ok(None));
        assert_eq!(parse_goal(Some("maintain")), Ok(Some(Goal::Maintain)));
        assert!(parse_goal(Some("bulk")).is_err());
    }
}
