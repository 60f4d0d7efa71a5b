//! Routine model

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::calc::IdGenerator;
use crate::db::{store, Collection, DbResult, Document};
use super::{Exercise, ExerciseKind, ExerciseLevel};

/// Prescription for one exercise inside a routine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub exercise_id: String,
    pub sets: Option<u32>,
    /// Free text, e.g. "10-12"
    pub reps: Option<String>,
    /// Cardio only, e.g. "30 min"
    pub duration: Option<String>,
    pub rest: Option<String>,
    pub notes: Option<String>,
}

/// Everything a caller may prescribe when adding an exercise
#[derive(Debug, Clone, Default)]
pub struct Prescription {
    pub sets: Option<u32>,
    pub reps: Option<String>,
    pub duration: Option<String>,
    pub rest: Option<String>,
    pub notes: Option<String>,
}

impl RoutineExercise {
    /// Cardio keeps the duration; every other kind keeps sets and reps
    pub fn prescribe(exercise: &Exercise, p: Prescription) -> Self {
        let (sets, reps, duration) = match exercise.kind {
            ExerciseKind::Cardio => (None, None, p.duration),
            _ => (p.sets, p.reps, None),
        };

        Self {
            exercise_id: exercise.id.clone(),
            sets,
            reps,
            duration,
            rest: p.rest,
            notes: p.notes,
        }
    }
}

/// An exercise routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: ExerciseLevel,
    pub objective: String,
    pub days_per_week: u8,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
    pub created_at: String,
}

impl Document for Routine {
    const COLLECTION: Collection = Collection::Routines;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Data for creating a routine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineCreate {
    pub name: String,
    #[serde(default)]
    pub level: ExerciseLevel,
    pub objective: String,
    pub days_per_week: u8,
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub instructions: String,
}

/// Data for updating a routine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutineUpdate {
    pub name: Option<String>,
    pub level: Option<ExerciseLevel>,
    pub objective: Option<String>,
    pub days_per_week: Option<u8>,
    pub duration_weeks: Option<u32>,
    pub instructions: Option<String>,
}

impl Routine {
    pub fn create(
        conn: &Connection,
        ids: &dyn IdGenerator,
        created_at: String,
        data: RoutineCreate,
    ) -> DbResult<Self> {
        let routine = Self {
            id: ids.next_id(),
            name: data.name,
            level: data.level,
            objective: data.objective,
            days_per_week: data.days_per_week,
            exercises: Vec::new(),
            duration_weeks: data.duration_weeks,
            instructions: data.instructions,
            created_at,
        };
        store::put(conn, &routine)?;
        Ok(routine)
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        store::get(conn, id)
    }

    /// List routines, optionally by level and case-insensitive name substring
    pub fn list(
        conn: &Connection,
        level: Option<ExerciseLevel>,
        name: Option<&str>,
    ) -> DbResult<Vec<Self>> {
        let all: Vec<Self> = store::list(conn)?;
        let name = name.map(str::to_lowercase);

        Ok(all
            .into_iter()
            .filter(|r| level.map_or(true, |l| r.level == l))
            .filter(|r| name.as_ref().map_or(true, |n| r.name.to_lowercase().contains(n)))
            .collect())
    }

    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        store::put(conn, self)
    }

    pub fn update(conn: &Connection, id: &str, data: &RoutineUpdate) -> DbResult<Option<Self>> {
        let Some(mut routine) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        if let Some(ref name) = data.name {
            routine.name = name.clone();
        }
        if let Some(level) = data.level {
            routine.level = level;
        }
        if let Some(ref objective) = data.objective {
            routine.objective = objective.clone();
        }
        if let Some(days) = data.days_per_week {
            routine.days_per_week = days;
        }
        if let Some(weeks) = data.duration_weeks {
            routine.duration_weeks = Some(weeks);
        }
        if let Some(ref instructions) = data.instructions {
            routine.instructions = instructions.clone();
        }

        routine.save(conn)?;
        Ok(Some(routine))
    }

    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        store::delete::<Self>(conn, id)
    }

    /// Routines that include the given exercise
    pub fn using_exercise(conn: &Connection, exercise_id: &str) -> DbResult<Vec<Self>> {
        let all: Vec<Self> = store::list(conn)?;
        Ok(all
            .into_iter()
            .filter(|r| r.exercises.iter().any(|e| e.exercise_id == exercise_id))
            .collect())
    }
}
