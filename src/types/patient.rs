use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

cell_enum! {
    /// Acute malnutrition grade.
    pub enum NutritionStatus {
        Sam => "sam",
        Mam => "mam",
        Normal => "normal",
    }
}

cell_enum! {
    pub enum AdmissionStatus {
        Registered => "registered",
        Admitted => "admitted",
        Discharged => "discharged",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age_months: Option<u32>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub anganwadi_id: Option<String>,
    /// User who registered the child; receives admission notices and follow-ups.
    pub registered_by: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    /// Mid-upper arm circumference.
    pub muac_cm: Option<f64>,
    pub edema: bool,
    pub nutrition_status: NutritionStatus,
    pub symptoms: Vec<String>,
    pub admission_status: AdmissionStatus,
    pub bed_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Patient {
    const TABLE: Table = Table::Patients;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        let t = Self::TABLE;
        Ok(Self {
            id: row.text("id"),
            name: row.text("name"),
            age_months: row.opt_parse(t, "age_months")?,
            gender: row.opt_text("gender"),
            guardian_name: row.opt_text("guardian_name"),
            phone: row.opt_text("phone"),
            address: row.opt_text("address"),
            anganwadi_id: row.opt_text("anganwadi_id"),
            registered_by: row.opt_text("registered_by"),
            weight_kg: row.opt_parse(t, "weight_kg")?,
            height_cm: row.opt_parse(t, "height_cm")?,
            muac_cm: row.opt_parse(t, "muac_cm")?,
            edema: row.flag("edema"),
            nutrition_status: row.parse(t, "nutrition_status")?,
            symptoms: row.json(t, "symptoms")?,
            admission_status: row.parse(t, "admission_status")?,
            bed_id: row.opt_text("bed_id"),
            created_at: row.parse(t, "created_at")?,
            updated_at: row.parse(t, "updated_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Row::new()
            .with("id", &self.id)
            .with("name", &self.name)
            .with_opt("age_months", self.age_months)
            .with_opt("gender", self.gender.as_ref())
            .with_opt("guardian_name", self.guardian_name.as_ref())
            .with_opt("phone", self.phone.as_ref())
            .with_opt("address", self.address.as_ref())
            .with_opt("anganwadi_id", self.anganwadi_id.as_ref())
            .with_opt("registered_by", self.registered_by.as_ref())
            .with_opt("weight_kg", self.weight_kg)
            .with_opt("height_cm", self.height_cm)
            .with_opt("muac_cm", self.muac_cm)
            .with("edema", self.edema.to_string())
            .with("nutrition_status", self.nutrition_status.as_str())
            .with("admission_status", self.admission_status.as_str())
            .with("bed_id", self.bed_id.clone().unwrap_or_default())
            .with("created_at", self.created_at.to_rfc3339())
            .with("updated_at", self.updated_at.to_rfc3339())
            .with_json("symptoms", &self.symptoms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPatient {
    pub name: String,
    pub age_months: Option<u32>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub anganwadi_id: Option<String>,
    pub registered_by: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub muac_cm: Option<f64>,
    pub edema: Option<bool>,
    /// Classified from MUAC and edema when omitted.
    pub nutrition_status: Option<NutritionStatus>,
    pub symptoms: Vec<String>,
}

/// Partial update. Bed and admission state belong to the bed operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub age_months: Option<u32>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub anganwadi_id: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub muac_cm: Option<f64>,
    pub edema: Option<bool>,
    pub nutrition_status: Option<NutritionStatus>,
    pub symptoms: Option<Vec<String>>,
}

impl PatientPatch {
    pub fn touches_anthropometry(&self) -> bool {
        self.muac_cm.is_some() || self.edema.is_some()
    }

    pub fn to_row(&self) -> Result<Row, NrcError> {
        let mut row = Row::new()
            .with_opt("name", self.name.as_ref().map(|n| n.trim()))
            .with_opt("age_months", self.age_months)
            .with_opt("gender", self.gender.as_ref())
            .with_opt("guardian_name", self.guardian_name.as_ref())
            .with_opt("phone", self.phone.as_ref())
            .with_opt("address", self.address.as_ref())
            .with_opt("anganwadi_id", self.anganwadi_id.as_ref())
            .with_opt("weight_kg", self.weight_kg)
            .with_opt("height_cm", self.height_cm)
            .with_opt("muac_cm", self.muac_cm)
            .with_opt("edema", self.edema)
            .with_opt("nutrition_status", self.nutrition_status);
        if let Some(symptoms) = &self.symptoms {
            row = row.with_json("symptoms", symptoms)?;
        }
        Ok(row)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientQuery {
    pub anganwadi_id: Option<String>,
    pub nutrition_status: Option<NutritionStatus>,
    pub admission_status: Option<AdmissionStatus>,
}

pub(crate) fn check_age(age_months: Option<u32>) -> Result<(), NrcError> {
    match age_months {
        Some(m) if m > 60 => Err(NrcError::validation(
            "age_months must be between 0 and 60",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patient {
        let now = Utc::now();
        Patient {
            id: "p1".into(),
            name: "Ravi".into(),
            age_months: Some(18),
            gender: Some("male".into()),
            guardian_name: Some("Lakshmi, mother".into()),
            phone: None,
            address: Some("Ward 4\nnear the well".into()),
            anganwadi_id: None,
            registered_by: Some("u1".into()),
            weight_kg: Some(7.2),
            height_cm: None,
            muac_cm: Some(11.1),
            edema: false,
            nutrition_status: NutritionStatus::Sam,
            symptoms: vec!["fever".into(), "diarrhoea, 3 days".into()],
            admission_status: AdmissionStatus::Registered,
            bed_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_round_trip_keeps_json_and_optionals() {
        let p = sample();
        let row = p.to_row().unwrap();
        assert_eq!(row.get("phone"), "");
        assert_eq!(row.get("symptoms"), r#"["fever","diarrhoea, 3 days"]"#);
        assert_eq!(Patient::from_row(&row).unwrap(), p);
    }

    #[test]
    fn patch_only_carries_given_fields() {
        let patch = PatientPatch {
            muac_cm: Some(12.0),
            ..Default::default()
        };
        let row = patch.to_row().unwrap();
        assert_eq!(row.columns().count(), 1);
        assert!(patch.touches_anthropometry());
    }

    #[test]
    fn age_is_bounded() {
        assert!(check_age(Some(61)).is_err());
        assert!(check_age(Some(0)).is_ok());
        assert!(check_age(None).is_ok());
    }
}
