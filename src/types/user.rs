use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

cell_enum! {
    pub enum Role {
        AnganwadiWorker => "anganwadi_worker",
        Supervisor => "supervisor",
        HospitalStaff => "hospital_staff",
        Admin => "admin",
    }
}

/// A login account. The password is stored as entered and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub employee_id: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub center_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            name: row.text("name"),
            username: row.text("username"),
            employee_id: row.text("employee_id"),
            password: row.text("password"),
            role: row.parse(Self::TABLE, "role")?,
            phone: row.opt_text("phone"),
            center_id: row.opt_text("center_id"),
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with("name", &self.name)
            .with("username", &self.username)
            .with("employee_id", &self.employee_id)
            .with("password", &self.password)
            .with("role", self.role.as_str())
            .with_opt("phone", self.phone.as_ref())
            .with_opt("center_id", self.center_id.as_ref())
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub employee_id: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub center_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}
