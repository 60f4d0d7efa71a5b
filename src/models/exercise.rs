//! Exercise model
//!
//! Catalog exercises that routines are built from.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::calc::IdGenerator;
use crate::db::{store, Collection, DbResult, Document};

/// Exercise kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Cardio,
    Strength,
    Flexibility,
    Functional,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Cardio => "cardio",
            ExerciseKind::Strength => "strength",
            ExerciseKind::Flexibility => "flexibility",
            ExerciseKind::Functional => "functional",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cardio" => Some(ExerciseKind::Cardio),
            "strength" | "weights" => Some(ExerciseKind::Strength),
            "flexibility" | "mobility" => Some(ExerciseKind::Flexibility),
            "functional" => Some(ExerciseKind::Functional),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Cardio => "Cardio",
            ExerciseKind::Strength => "Strength",
            ExerciseKind::Flexibility => "Flexibility",
            ExerciseKind::Functional => "Functional",
        }
    }
}

/// Training level, shared by exercises and routines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ExerciseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseLevel::Beginner => "beginner",
            ExerciseLevel::Intermediate => "intermediate",
            ExerciseLevel::Advanced => "advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(ExerciseLevel::Beginner),
            "intermediate" => Some(ExerciseLevel::Intermediate),
            "advanced" => Some(ExerciseLevel::Advanced),
            _ => None,
        }
    }
}

/// A catalog exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    pub kind: ExerciseKind,
    #[serde(default)]
    pub levels: Vec<ExerciseLevel>,
    #[serde(default)]
    pub description: String,
    /// Estimated kcal burned per 30 minutes
    pub calories_per_30min: Option<f64>,
}

impl Document for Exercise {
    const COLLECTION: Collection = Collection::Exercises;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Data for creating a new exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseCreate {
    pub name: String,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    pub kind: ExerciseKind,
    #[serde(default)]
    pub levels: Vec<ExerciseLevel>,
    #[serde(default)]
    pub description: String,
    pub calories_per_30min: Option<f64>,
}

/// Data for updating an exercise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub muscle_groups: Option<Vec<String>>,
    pub kind: Option<ExerciseKind>,
    pub levels: Option<Vec<ExerciseLevel>>,
    pub description: Option<String>,
    pub calories_per_30min: Option<f64>,
}

impl Exercise {
    pub fn create(conn: &Connection, ids: &dyn IdGenerator, data: ExerciseCreate) -> DbResult<Self> {
        let exercise = Self {
            id: ids.next_id(),
            name: data.name,
            muscle_groups: data.muscle_groups,
            kind: data.kind,
            levels: data.levels,
            description: data.description,
            calories_per_30min: data.calories_per_30min,
        };
        store::put(conn, &exercise)?;
        Ok(exercise)
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        store::get(conn, id)
    }

    /// List exercises, optionally narrowed by kind, level or muscle group
    pub fn list(
        conn: &Connection,
        kind: Option<ExerciseKind>,
        level: Option<ExerciseLevel>,
        muscle_group: Option<&str>,
    ) -> DbResult<Vec<Self>> {
        let all: Vec<Self> = store::list(conn)?;
        let muscle_group = muscle_group.map(str::to_lowercase);

        Ok(all
            .into_iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .filter(|e| level.map_or(true, |l| e.levels.contains(&l)))
            .filter(|e| {
                muscle_group.as_ref().map_or(true, |m| {
                    e.muscle_groups.iter().any(|g| g.to_lowercase() == *m)
                })
            })
            .collect())
    }

    pub fn update(conn: &Connection, id: &str, data: &ExerciseUpdate) -> DbResult<Option<Self>> {
        let Some(mut exercise) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        if let Some(ref name) = data.name {
            exercise.name = name.clone();
        }
        if let Some(ref groups) = data.muscle_groups {
            exercise.muscle_groups = groups.clone();
        }
        if let Some(kind) = data.kind {
            exercise.kind = kind;
        }
        if let Some(ref levels) = data.levels {
            exercise.levels = levels.clone();
        }
        if let Some(ref description) = data.description {
            exercise.description = description.clone();
        }
        if let Some(calories) = data.calories_per_30min {
            exercise.calories_per_30min = Some(calories);
        }

        store::put(conn, &exercise)?;
        Ok(Some(exercise))
    }

    /// Delete an exercise. Callers check routine usage first.
    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        store::delete::<Self>(conn, id)
    }
}
