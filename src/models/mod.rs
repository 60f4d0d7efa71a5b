//! Data models
//!
//! Records persisted as JSON documents in the store.

mod diet;
mod exercise;
mod food_item;
mod nutrition;
mod patient;
mod routine;

pub use diet::{calculate_diet_totals, Diet, DietCreate, DietUpdate, Meal};
pub use exercise::{Exercise, ExerciseCreate, ExerciseKind, ExerciseLevel, ExerciseUpdate};
pub use food_item::{FoodCategory, FoodFilter, FoodItem, FoodItemCreate, FoodItemUpdate};
pub use nutrition::Nutrition;
pub use patient::{
    ConsultationNote, DietaryAssessment, Lifestyle, MedicalHistory, Patient, PatientGoals,
    PatientProfile,
};
pub use routine::{Prescription, Routine, RoutineCreate, RoutineExercise, RoutineUpdate};
