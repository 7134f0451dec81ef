//! Fixed per-table column schemas.
//!
//! The column list of a table is the header of its CSV file and the column
//! set of its SQLite table. `id` is always the first column.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Patients,
    Beds,
    Notifications,
    Visits,
    TreatmentTrackers,
    AnganwadiCenters,
    Workers,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Users,
        Table::Patients,
        Table::Beds,
        Table::Notifications,
        Table::Visits,
        Table::TreatmentTrackers,
        Table::AnganwadiCenters,
        Table::Workers,
    ];

    /// Table name in SQLite and stem of the CSV file name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Patients => "patients",
            Table::Beds => "beds",
            Table::Notifications => "notifications",
            Table::Visits => "visits",
            Table::TreatmentTrackers => "treatment_trackers",
            Table::AnganwadiCenters => "anganwadi_centers",
            Table::Workers => "workers",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Table::Users => "users.csv",
            Table::Patients => "patients.csv",
            Table::Beds => "beds.csv",
            Table::Notifications => "notifications.csv",
            Table::Visits => "visits.csv",
            Table::TreatmentTrackers => "treatment_trackers.csv",
            Table::AnganwadiCenters => "anganwadi_centers.csv",
            Table::Workers => "workers.csv",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Users => &[
                "id",
                "name",
                "username",
                "employee_id",
                "password",
                "role",
                "phone",
                "center_id",
                "created_at",
            ],
            Table::Patients => &[
                "id",
                "name",
                "age_months",
                "gender",
                "guardian_name",
                "phone",
                "address",
                "anganwadi_id",
                "registered_by",
                "weight_kg",
                "height_cm",
                "muac_cm",
                "edema",
                "nutrition_status",
                "symptoms",
                "admission_status",
                "bed_id",
                "created_at",
                "updated_at",
            ],
            Table::Beds => &[
                "id",
                "ward",
                "bed_number",
                "status",
                "patient_id",
                "assigned_at",
                "created_at",
            ],
            Table::Notifications => &[
                "id",
                "user_id",
                "recipient_role",
                "kind",
                "message",
                "patient_id",
                "read",
                "created_at",
            ],
            Table::Visits => &[
                "id",
                "patient_id",
                "worker_id",
                "scheduled_date",
                "kind",
                "status",
                "notes",
                "completed_at",
                "created_at",
            ],
            Table::TreatmentTrackers => &[
                "id",
                "patient_id",
                "admission_date",
                "admission_weight_kg",
                "target_weight_kg",
                "medications",
                "daily_records",
                "status",
                "discharge_date",
                "discharge_weight_kg",
                "created_at",
                "updated_at",
            ],
            Table::AnganwadiCenters => &[
                "id",
                "name",
                "code",
                "district",
                "block",
                "village",
                "supervisor_id",
                "created_at",
            ],
            Table::Workers => &[
                "id",
                "name",
                "employee_id",
                "phone",
                "center_id",
                "created_at",
            ],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// SQLite DDL for this table. Every cell is TEXT, mirroring the CSV files.
    pub fn sqlite_ddl(self) -> String {
        let cols = self
            .columns()
            .iter()
            .map(|c| {
                if *c == "id" {
                    "id TEXT PRIMARY KEY NOT NULL".to_string()
                } else {
                    format!("{c} TEXT NOT NULL DEFAULT ''")
                }
            })
            .collect::<Vec<_>>()
            .join(",\n    ");
        format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", self.name(), cols)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_starts_with_id() {
        for table in Table::ALL {
            assert_eq!(table.columns()[0], "id", "{table}");
            assert!(table.file_name().starts_with(table.name()));
        }
    }

    #[test]
    fn ddl_lists_all_columns() {
        let ddl = Table::Beds.sqlite_ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS beds"));
        assert!(ddl.contains("id TEXT PRIMARY KEY NOT NULL"));
        assert!(ddl.contains("bed_number TEXT NOT NULL DEFAULT ''"));
    }
}
