//! Goal-based targets
//!
//! Calorie adjustment and macronutrient split per goal category. Unknown goal
//! labels are not an error: they get the maintenance targets. This differs
//! from activity levels, which reject unknown labels.

use serde::{Deserialize, Serialize};

/// Nutrition goal category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    ReduceWeight,
    GainWeight,
    CutDefine,
    GainMuscle,
    Maintain,
    Cardiovascular,
}

impl Goal {
    pub const ALL: [Goal; 6] = [
        Goal::ReduceWeight,
        Goal::GainWeight,
        Goal::CutDefine,
        Goal::GainMuscle,
        Goal::Maintain,
        Goal::Cardiovascular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::ReduceWeight => "reduce_weight",
            Goal::GainWeight => "gain_weight",
            Goal::CutDefine => "cut_define",
            Goal::GainMuscle => "gain_muscle",
            Goal::Maintain => "maintain",
            Goal::Cardiovascular => "cardiovascular",
        }
    }

    /// Parse a goal label. `None` means unrecognized.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(|c: char| c == '-' || c == ' ', "_").as_str() {
            "reduce_weight" | "lose_weight" | "weight_loss" => Some(Goal::ReduceWeight),
            "gain_weight" | "weight_gain" => Some(Goal::GainWeight),
            "cut_define" | "cut" | "define" => Some(Goal::CutDefine),
            "gain_muscle" | "muscle_gain" => Some(Goal::GainMuscle),
            "maintain" | "maintenance" => Some(Goal::Maintain),
            "cardiovascular" | "cardiovascular_health" | "heart_health" => {
                Some(Goal::Cardiovascular)
            }
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Goal::ReduceWeight => "Reduce weight",
            Goal::GainWeight => "Gain weight",
            Goal::CutDefine => "Cut / define",
            Goal::GainMuscle => "Gain muscle",
            Goal::Maintain => "Maintain",
            Goal::Cardiovascular => "Cardiovascular health",
        }
    }
}

/// Macronutrient split as percentages of total calories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDistribution {
    pub protein: u8,
    pub carbs: u8,
    pub fat: u8,
}

impl MacroDistribution {
    pub fn total(&self) -> u32 {
        u32::from(self.protein) + u32::from(self.carbs) + u32::from(self.fat)
    }
}

impl Default for MacroDistribution {
    fn default() -> Self {
        macro_distribution_for_goal(None)
    }
}

/// Daily calorie target for a goal, rounded to whole kcal.
///
/// `None` (an unrecognized goal) is treated like maintenance.
pub fn calorie_target_for_goal(tdee: f64, goal: Option<Goal>) -> i64 {
    let target = match goal {
        Some(Goal::ReduceWeight) => tdee * 0.80,
        Some(Goal::GainWeight) | Some(Goal::GainMuscle) => tdee * 1.15,
        Some(Goal::CutDefine) => tdee * 0.85,
        Some(Goal::Maintain) | Some(Goal::Cardiovascular) | None => tdee,
    };
    target.round() as i64
}

/// Macro split for a goal. `None` gets the maintenance split.
pub fn macro_distribution_for_goal(goal: Option<Goal>) -> MacroDistribution {
    let (protein, carbs, fat) = match goal {
        Some(Goal::ReduceWeight) => (35, 35, 30),
        Some(Goal::GainWeight) => (25, 50, 25),
        Some(Goal::GainMuscle) => (30, 45, 25),
        Some(Goal::CutDefine) => (40, 30, 30),
        Some(Goal::Maintain) | Some(Goal::Cardiovascular) | None => (30, 40, 30),
    };
    MacroDistribution { protein, carbs, fat }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calorie_target_reduce_weight() {
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::ReduceWeight)), 1600);
    }

    #[test]
    fn test_calorie_targets_by_goal() {
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::GainWeight)), 2300);
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::GainMuscle)), 2300);
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::CutDefine)), 1700);
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::Maintain)), 2000);
        assert_eq!(calorie_target_for_goal(2000.0, Some(Goal::Cardiovascular)), 2000);
    }

    #[test]
    fn test_calorie_target_rounds_to_integer() {
        assert_eq!(calorie_target_for_goal(2628.29, Some(Goal::ReduceWeight)), 2103);
        assert_eq!(calorie_target_for_goal(2628.29, Some(Goal::Maintain)), 2628);
    }

    #[test]
    fn test_unrecognized_goal_falls_back_to_maintain() {
        // Documented behavior: unknown goals never fail
        let goal = Goal::from_str("bulk_up_fast");
        assert_eq!(goal, None);
        assert_eq!(calorie_target_for_goal(2000.0, goal), 2000);
        assert_eq!(
            macro_distribution_for_goal(goal),
            macro_distribution_for_goal(Some(Goal::Maintain))
        );
    }

    #[test]
    fn test_macro_distribution_reduce_weight() {
        assert_eq!(
            macro_distribution_for_goal(Some(Goal::ReduceWeight)),
            MacroDistribution { protein: 35, carbs: 35, fat: 30 }
        );
    }

    #[test]
    fn test_macro_distributions_sum_to_100() {
        for goal in Goal::ALL {
            assert_eq!(macro_distribution_for_goal(Some(goal)).total(), 100, "{:?}", goal);
        }
        assert_eq!(macro_distribution_for_goal(None).total(), 100);
    }

    #[test]
    fn test_default_macro_distribution() {
        assert_eq!(MacroDistribution::default(), MacroDistribution { protein: 30, carbs: 40, fat: 30 });
    }

    #[test]
    fn test_goal_labels() {
        for goal in Goal::ALL {
            assert_eq!(Goal::from_str(goal.as_str()), Some(goal));
        }
        assert_eq!(Goal::from_str("Gain Muscle"), Some(Goal::GainMuscle));
    }
}
