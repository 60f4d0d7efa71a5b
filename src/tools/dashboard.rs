//! Practice Dashboard Tool

use serde::Serialize;

use crate::calc::Goal;
use crate::db::{store, Collection, Database};
use crate::models::Patient;

/// Patients sharing a goal
#[derive(Debug, Serialize)]
pub struct GoalCount {
    pub goal: Goal,
    pub label: &'static str,
    pub patients: usize,
}

/// Response for dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub patients: i64,
    pub diets: i64,
    pub routines: i64,
    pub foods: i64,
    pub exercises: i64,
    /// Every goal, including those with no patients
    pub patients_by_goal: Vec<GoalCount>,
    pub patients_without_goal: usize,
}

/// Record totals and the goal breakdown of patients
pub fn dashboard(db: &Database) -> Result<DashboardResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let count = |collection: Collection| {
        store::count(&conn, collection)
            .map_err(|e| format!("Failed to count {}: {}", collection.as_str(), e))
    };

    let patients = Patient::list(&conn).map_err(|e| format!("Failed to list patients: {}", e))?;

    let patients_by_goal = Goal::ALL
        .iter()
        .map(|goal| GoalCount {
            goal: *goal,
            label: goal.display_name(),
            patients: patients
                .iter()
                .filter(|p| p.profile.goals.goal == Some(*goal))
                .count(),
        })
        .collect();

    Ok(DashboardResponse {
        patients: count(Collection::Patients)?,
        diets: count(Collection::Diets)?,
        routines: count(Collection::Routines)?,
        foods: count(Collection::Foods)?,
        exercises: count(Collection::Exercises)?,
        patients_by_goal,
        patients_without_goal: patients
            .iter()
            .filter(|p| p.profile.goals.goal.is_none())
            .count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_db, FixedClock, SequentialIds};
    use crate::tools::patients::{save_patient, tests as fixtures};

    #[test]
    fn test_dashboard_counts() {
        let db = migrated_db();
        let ids = SequentialIds::new("p");
        let clock = FixedClock::default();

        save_patient(&db, &ids, &clock, None, fixtures::form("Ana", "Lopez"), fixtures::measurements(60.0))
            .unwrap();
        let mut no_goal = fixtures::form("Luis", "Garcia");
        no_goal.goal = None;
        save_patient(&db, &ids, &clock, None, no_goal, fixtures::measurements(80.0)).unwrap();

        let d = dashboard(&db).unwrap();
        assert_eq!(d.patients, 2);
        assert_eq!(d.diets, 0);
        assert_eq!(d.foods, 30);
        assert_eq!(d.exercises, 22);
        assert_eq!(d.patients_by_goal.len(), 6);

        let reduce = d
            .patients_by_goal
            .iter()
            .find(|g| g.goal == Goal::ReduceWeight)
            .unwrap();
        assert_eq!(reduce.patients, 1);
        assert_eq!(d.patients_without_goal, 1);
    }
}
