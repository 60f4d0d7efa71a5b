//! Food Item model
//!
//! A catalog food with nutrition per standard portion.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::calc::{Goal, IdGenerator};
use crate::db::{store, Collection, DbResult, Document};
use super::Nutrition;

/// Food group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Protein,
    Carbohydrate,
    Fat,
    Vegetable,
    Fruit,
    Dairy,
    Beverage,
    #[default]
    Other,
}

impl FoodCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Protein => "protein",
            FoodCategory::Carbohydrate => "carbohydrate",
            FoodCategory::Fat => "fat",
            FoodCategory::Vegetable => "vegetable",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Beverage => "beverage",
            FoodCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "protein" => Some(FoodCategory::Protein),
            "carbohydrate" | "carb" | "carbs" => Some(FoodCategory::Carbohydrate),
            "fat" => Some(FoodCategory::Fat),
            "vegetable" | "veg" => Some(FoodCategory::Vegetable),
            "fruit" => Some(FoodCategory::Fruit),
            "dairy" => Some(FoodCategory::Dairy),
            "beverage" | "drink" => Some(FoodCategory::Beverage),
            "other" => Some(FoodCategory::Other),
            _ => None,
        }
    }
}

/// A food item with nutritional information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
    /// Goals this food suits
    #[serde(default)]
    pub suitable_goals: Vec<Goal>,
    /// Standard portion in grams; nutrition is per portion
    pub portion_g: f64,
    pub nutrition: Nutrition,
    pub notes: Option<String>,
}

impl Document for FoodItem {
    const COLLECTION: Collection = Collection::Foods;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Data for creating a new food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub category: FoodCategory,
    #[serde(default)]
    pub suitable_goals: Vec<Goal>,
    pub portion_g: f64,
    pub nutrition: Nutrition,
    pub notes: Option<String>,
}

/// Data for updating a food item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodItemUpdate {
    pub name: Option<String>,
    pub category: Option<FoodCategory>,
    pub suitable_goals: Option<Vec<Goal>>,
    pub portion_g: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub sugar: Option<f64>,
    pub notes: Option<String>,
}

/// Food list filter; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct FoodFilter {
    pub category: Option<FoodCategory>,
    pub goal: Option<Goal>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
}

impl FoodFilter {
    pub fn matches(&self, food: &FoodItem) -> bool {
        if let Some(category) = self.category {
            if food.category != category {
                return false;
            }
        }
        if let Some(goal) = self.goal {
            if !food.suitable_goals.contains(&goal) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !food.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

impl FoodItem {
    /// Insert a new food item into the database
    pub fn create(conn: &Connection, ids: &dyn IdGenerator, data: FoodItemCreate) -> DbResult<Self> {
        let food = Self {
            id: ids.next_id(),
            name: data.name,
            category: data.category,
            suitable_goals: data.suitable_goals,
            portion_g: data.portion_g,
            nutrition: data.nutrition,
            notes: data.notes,
        };
        store::put(conn, &food)?;
        Ok(food)
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        store::get(conn, id)
    }

    /// List food items matching a filter, in catalog order
    pub fn list(conn: &Connection, filter: &FoodFilter) -> DbResult<Vec<Self>> {
        let foods: Vec<Self> = store::list(conn)?;
        Ok(foods.into_iter().filter(|f| filter.matches(f)).collect())
    }

    /// Update a food item. Returns `None` if it does not exist.
    pub fn update(conn: &Connection, id: &str, data: &FoodItemUpdate) -> DbResult<Option<Self>> {
        let Some(mut food) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        if let Some(ref name) = data.name {
            food.name = name.clone();
        }
        if let Some(category) = data.category {
            food.category = category;
        }
        if let Some(ref goals) = data.suitable_goals {
            food.suitable_goals = goals.clone();
        }
        if let Some(portion) = data.portion_g {
            food.portion_g = portion;
        }
        if let Some(v) = data.calories {
            food.nutrition.calories = v;
        }
        if let Some(v) = data.protein {
            food.nutrition.protein = v;
        }
        if let Some(v) = data.carbs {
            food.nutrition.carbs = v;
        }
        if let Some(v) = data.fat {
            food.nutrition.fat = v;
        }
        if let Some(v) = data.fiber {
            food.nutrition.fiber = v;
        }
        if let Some(v) = data.sodium {
            food.nutrition.sodium = v;
        }
        if let Some(v) = data.sugar {
            food.nutrition.sugar = v;
        }
        if let Some(ref notes) = data.notes {
            food.notes = Some(notes.clone());
        }

        store::put(conn, &food)?;
        Ok(Some(food))
    }

    /// Delete a food item. Callers check diet usage first.
    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        store::delete::<Self>(conn, id)
    }
}
