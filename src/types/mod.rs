//! Domain records and request/response payloads.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Enum stored as a fixed lower-case token both on the wire and in cells.
macro_rules! cell_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $text)] $(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} `{}`", stringify!($name), other)),
                }
            }
        }
    };
}

pub mod anganwadi;
pub mod bed;
pub mod notification;
pub mod patient;
pub mod treatment;
pub mod user;
pub mod visit;
pub mod worker;

pub use anganwadi::AnganwadiCenter;
pub use bed::{Bed, BedStatus};
pub use notification::{Notification, NotificationKind};
pub use patient::{AdmissionStatus, NutritionStatus, Patient};
pub use treatment::{DailyRecord, TrackerStatus, TreatmentTracker};
pub use user::{Role, User};
pub use visit::{Visit, VisitKind, VisitStatus};
pub use worker::Worker;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Trim and drop blank optional text from request payloads.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, crate::NrcError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(crate::NrcError::validation(format!("{field} is required")));
    }
    Ok(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_enums_round_trip_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert_eq!(
            serde_json::to_string(&Role::HospitalStaff).unwrap(),
            "\"hospital_staff\""
        );
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required("name", "   ").is_err());
        assert_eq!(required("name", " Asha ").unwrap(), "Asha");
        assert_eq!(clean(Some("  ".into())), None);
    }
}
