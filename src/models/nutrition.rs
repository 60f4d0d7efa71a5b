//! Shared nutrition data structure
//!
//! Used by food items (per portion) and diet totals.

use serde::{Deserialize, Serialize};

use crate::calc::round_to;

/// Nutritional information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,      // grams
    pub carbs: f64,        // grams
    pub fat: f64,          // grams
    #[serde(default)]
    pub fiber: f64,        // grams
    #[serde(default)]
    pub sodium: f64,       // milligrams
    #[serde(default)]
    pub sugar: f64,        // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
            fiber: self.fiber * multiplier,
            sodium: self.sodium * multiplier,
            sugar: self.sugar * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
            fiber: self.fiber + other.fiber,
            sodium: self.sodium + other.sodium,
            sugar: self.sugar + other.sugar,
        }
    }

    /// Display rounding: whole calories and milligrams, grams to one decimal
    pub fn rounded(&self) -> Self {
        Self {
            calories: round_to(self.calories, 0),
            protein: round_to(self.protein, 1),
            carbs: round_to(self.carbs, 1),
            fat: round_to(self.fat, 1),
            fiber: round_to(self.fiber, 1),
            sodium: round_to(self.sodium, 0),
            sugar: round_to(self.sugar, 1),
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}
