//! Patient model
//!
//! A patient record carries the clinical profile, the current measurement
//! snapshot and the append-only measurement history.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::calc::{
    complete_snapshot, ActivityLevel, CalcResult, Clock, Goal, IdGenerator, MeasurementInput,
    MeasurementSnapshot, Sex,
};
use crate::db::{store, Collection, DbResult, Document};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub past_surgeries: Vec<String>,
    pub family_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifestyle {
    #[serde(default)]
    pub drinks_alcohol: bool,
    pub alcohol_frequency: Option<String>,
    #[serde(default)]
    pub smoker: bool,
    pub cigarettes_per_day: Option<u32>,
    pub sleep_hours: Option<f64>,
    /// 1 (low) to 10 (high)
    pub stress_level: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientGoals {
    pub target_weight_kg: Option<f64>,
    pub target_body_fat_percent: Option<f64>,
    pub goal: Option<Goal>,
    pub target_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietaryAssessment {
    pub recall_24h: Option<String>,
    pub intake_frequency: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

/// Editable part of a patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub first_name: String,
    pub last_name: String,
    pub sex: Sex,
    pub age: u32,
    pub activity_level: ActivityLevel,
    pub birth_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    #[serde(default)]
    pub medical_history: MedicalHistory,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub goals: PatientGoals,
    #[serde(default)]
    pub dietary_assessment: DietaryAssessment,
}

/// Note taken during a consultation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationNote {
    pub id: String,
    pub timestamp: String,
    pub note: String,
    pub weight_kg: Option<f64>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(flatten)]
    pub profile: PatientProfile,
    pub current_measurements: Option<MeasurementSnapshot>,
    /// Oldest first; the last entry equals `current_measurements`
    #[serde(default)]
    pub measurement_history: Vec<MeasurementSnapshot>,
    pub assigned_diet_id: Option<String>,
    pub assigned_routine_id: Option<String>,
    #[serde(default)]
    pub consultation_notes: Vec<ConsultationNote>,
    pub registered_at: String,
    pub last_consultation_at: Option<String>,
}

impl Document for Patient {
    const COLLECTION: Collection = Collection::Patients;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Patient {
    /// A new record with no measurements yet
    pub fn new(id: String, profile: PatientProfile, registered_at: String) -> Self {
        Self {
            id,
            profile,
            current_measurements: None,
            measurement_history: Vec::new(),
            assigned_diet_id: None,
            assigned_routine_id: None,
            consultation_notes: Vec::new(),
            registered_at,
            last_consultation_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
    }

    /// Make a snapshot current and append it to the history
    pub fn record_measurement(&mut self, snapshot: MeasurementSnapshot) {
        self.measurement_history.push(snapshot.clone());
        self.current_measurements = Some(snapshot);
    }

    pub fn current_weight(&self) -> Option<f64> {
        self.current_measurements.as_ref().map(|m| m.weight_kg)
    }

    /// Recompute the current snapshot from its own inputs and the current
    /// profile. The snapshot keeps its id and timestamp, and the history entry
    /// with the same id is replaced too. Returns the previous snapshot.
    pub fn recalculate_current(
        &mut self,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> CalcResult<Option<MeasurementSnapshot>> {
        let Some(previous) = self.current_measurements.clone() else {
            return Ok(None);
        };

        let input = MeasurementInput::from(&previous);
        let updated = complete_snapshot(
            &input,
            self.profile.age,
            self.profile.sex,
            self.profile.activity_level,
            ids,
            clock,
        )?;

        if let Some(entry) = self
            .measurement_history
            .iter_mut()
            .find(|m| m.id == updated.id)
        {
            *entry = updated.clone();
        }
        self.current_measurements = Some(updated);

        Ok(Some(previous))
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> DbResult<Option<Self>> {
        store::get(conn, id)
    }

    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        store::list(conn)
    }

    /// Case-insensitive substring match on first or last name.
    /// A blank query returns every patient.
    pub fn search(conn: &Connection, query: &str) -> DbResult<Vec<Self>> {
        let query = query.trim().to_lowercase();
        let all = Self::list(conn)?;
        if query.is_empty() {
            return Ok(all);
        }

        Ok(all
            .into_iter()
            .filter(|p| {
                p.profile.first_name.to_lowercase().contains(&query)
                    || p.profile.last_name.to_lowercase().contains(&query)
            })
            .collect())
    }

    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        store::put(conn, self)
    }

    pub fn delete(conn: &Connection, id: &str) -> DbResult<bool> {
        store::delete::<Self>(conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_db, FixedClock, SequentialIds};

    fn profile(first: &str, last: &str) -> PatientProfile {
        PatientProfile {
            first_name: first.to_string(),
            last_name: last.to_string(),
            sex: Sex::Female,
            age: 34,
            activity_level: ActivityLevel::Light,
            birth_date: None,
            phone: None,
            email: None,
            occupation: None,
            medical_history: MedicalHistory::default(),
            lifestyle: Lifestyle::default(),
            goals: PatientGoals::default(),
            dietary_assessment: DietaryAssessment::default(),
        }
    }

    #[test]
    fn test_search_first_or_last_name() {
        let db = migrated_db();
        let conn = db.get_conn().unwrap();

        Patient::new("p1".into(), profile("Ana", "Lopez"), "t".into()).save(&conn).unwrap();
        Patient::new("p2".into(), profile("Maria", "Anaya"), "t".into()).save(&conn).unwrap();
        Patient::new("p3".into(), profile("Lucia", "Perez"), "t".into()).save(&conn).unwrap();

        let found = Patient::search(&conn, "ANA").unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        assert_eq!(Patient::search(&conn, "  ").unwrap().len(), 3);
        assert!(Patient::search(&conn, "zz").unwrap().is_empty());
    }

    #[test]
    fn test_record_measurement_appends() {
        let ids = SequentialIds::new("m");
        let clock = FixedClock::default();
        let mut patient = Patient::new("p1".into(), profile("Ana", "Lopez"), "t".into());

        for weight in [68.0, 66.5] {
            let input = MeasurementInput {
                weight_kg: Some(weight),
                height_cm: Some(162.0),
                ..Default::default()
            };
            let snap =
                complete_snapshot(&input, 34, Sex::Female, ActivityLevel::Light, &ids, &clock)
                    .unwrap();
            patient.record_measurement(snap);
        }

        assert_eq!(patient.measurement_history.len(), 2);
        assert_eq!(patient.current_weight(), Some(66.5));
        assert_eq!(
            patient.current_measurements.as_ref(),
            patient.measurement_history.last()
        );
    }

    #[test]
    fn test_document_round_trip_is_flat() {
        let db = migrated_db();
        let conn = db.get_conn().unwrap();
        let patient = Patient::new("p1".into(), profile("Ana", "Lopez"), "t".into());
        patient.save(&conn).unwrap();

        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["first_name"], "Ana");
        assert_eq!(json["activity_level"], "light");

        let loaded = Patient::get_by_id(&conn, "p1").unwrap().unwrap();
        assert_eq!(loaded, patient);
        assert_eq!(loaded.full_name(), "Ana Lopez");
    }
    #[test]
    fn test_recalculate_current_keeps_identity() {
        let ids = SequentialIds::new("m");
        let clock = FixedClock::default();
        let mut patient = Patient::new("p1".into(), profile("Ana", "Lopez"), "t".into());
        assert_eq!(patient.recalculate_current(&ids, &clock).unwrap(), None);

        let input = MeasurementInput {
            weight_kg: Some(68.0),
            height_cm: Some(162.0),
            ..Default::default()
        };
        let snap =
            complete_snapshot(&input, 34, Sex::Female, ActivityLevel::Light, &ids, &clock).unwrap();
        patient.record_measurement(snap.clone());

        patient.profile.activity_level = ActivityLevel::Active;
        let previous = patient.recalculate_current(&ids, &clock).unwrap().unwrap();
        assert_eq!(previous, snap);

        let current = patient.current_measurements.clone().unwrap();
        assert_eq!(current.id, snap.id);
        assert_eq!(current.timestamp, snap.timestamp);
        assert!(current.tdee_kcal > snap.tdee_kcal);
        assert_eq!(patient.measurement_history, vec![current]);
    }

    #[test]
    fn test_recalculate_after_sex_correction_rederives_body_fat() {
        let ids = SequentialIds::new("m");
        let clock = FixedClock::default();
        let mut patient = Patient::new("p1".into(), profile("Ana", "Lopez"), "t".into());
        patient.profile.sex = Sex::Male;

        let input = MeasurementInput {
            weight_kg: Some(62.0),
            height_cm: Some(165.0),
            circumferences: crate::calc::Circumferences {
                waist: Some(80.0),
                hip: Some(100.0),
                neck: Some(34.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let snap =
            complete_snapshot(&input, 34, Sex::Male, ActivityLevel::Light, &ids, &clock).unwrap();
        let male_body_fat = snap.body_fat_percent;
        patient.record_measurement(snap);

        patient.profile.sex = Sex::Female;
        patient.recalculate_current(&ids, &clock).unwrap();

        let current = patient.current_measurements.clone().unwrap();
        assert_eq!(current.body_fat_percent, Some(31.4));
        assert_ne!(current.body_fat_percent, male_body_fat);
        assert_eq!(current.lean_mass_kg, Some(42.53));
        assert_eq!(current.entered.body_fat_percent, None);
    }
}
