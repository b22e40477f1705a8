use mongodb::bson::{Bson, DateTime, Document, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{ContactInfo, PaymentResponse, ServiceSummary};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "IN_PROGRESS" => Ok(BookingStatus::InProgress),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_id: ObjectId,
    pub cleaner_id: Option<ObjectId>,
    pub service_id: ObjectId,
    pub scheduled_at: DateTime,
    pub duration: i32,
    pub total_price: f64,
    pub address: String,
    pub special_instructions: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingDto {
    pub service_type: Option<String>,
    pub service_name: Option<String>,
    pub scheduled_at: Option<String>,
    pub address: Option<String>,
    pub special_instructions: Option<String>,
    pub total_price: Option<f64>,
    pub duration: Option<i32>,
}

/// Creation payload after required-field and time validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub service_type: crate::models::ServiceType,
    pub service_name: String,
    pub scheduled_at: chrono::DateTime<chrono::Utc>,
    pub address: String,
    pub total_price: f64,
}

impl CreateBookingDto {
    /// Checks the required fields and parses the typed parts. `now` is an
    /// argument so the strictly-in-the-future rule is deterministic.
    pub fn validate(&self, now: chrono::DateTime<chrono::Utc>) -> Result<ValidBooking, String> {
        let (Some(service_type), Some(service_name), Some(scheduled_at), Some(address), Some(total_price)) = (
            self.service_type.as_deref(),
            self.service_name.as_deref(),
            self.scheduled_at.as_deref(),
            self.address.as_deref(),
            self.total_price,
        ) else {
            return Err("Missing required fields".to_string());
        };

        let service_type = service_type
            .parse()
            .map_err(|_| "Invalid service type".to_string())?;

        let scheduled_at = chrono::DateTime::parse_from_rfc3339(scheduled_at)
            .map_err(|_| "Invalid scheduled time".to_string())?
            .with_timezone(&chrono::Utc);
        if scheduled_at <= now {
            return Err("Scheduled time must be in the future".to_string());
        }

        Ok(ValidBooking {
            service_type,
            service_name: service_name.to_string(),
            scheduled_at,
            address: address.to_string(),
            total_price,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateDto {
    pub status: Option<String>,
    /// Absent → leave unchanged; explicit `null` or `""` → clear the
    /// assignment. The double `Option` keeps null and absent apart.
    #[serde(default, deserialize_with = "deserialize_explicit")]
    pub cleaner_id: Option<Option<String>>,
}

fn deserialize_explicit<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CleanerUpdateDto {
    pub status: Option<String>,
}

/// Explicit form of the admin patch body. Status and assignment are
/// independent commands; either, both, or neither may be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingCommand {
    SetStatus(BookingStatus),
    AssignCleaner(Option<ObjectId>),
}

impl BookingCommand {
    /// Parses the loosely-typed patch payload into commands, validating each
    /// field against its domain. An empty `cleanerId` clears the assignment.
    pub fn from_admin_dto(dto: &AdminUpdateDto) -> Result<Vec<BookingCommand>, String> {
        let mut commands = Vec::new();

        if let Some(status) = dto.status.as_deref() {
            let status: BookingStatus = status
                .parse()
                .map_err(|_| format!("Invalid status: {}", status))?;
            commands.push(BookingCommand::SetStatus(status));
        }

        match &dto.cleaner_id {
            None => {}
            Some(None) => commands.push(BookingCommand::AssignCleaner(None)),
            Some(Some(cleaner_id)) if cleaner_id.is_empty() => {
                commands.push(BookingCommand::AssignCleaner(None));
            }
            Some(Some(cleaner_id)) => {
                let id = ObjectId::parse_str(cleaner_id)
                    .map_err(|_| "Invalid cleaner ID".to_string())?;
                commands.push(BookingCommand::AssignCleaner(Some(id)));
            }
        }

        Ok(commands)
    }

    pub fn apply(&self, update: &mut Document) {
        match self {
            BookingCommand::SetStatus(status) => {
                update.insert("status", status.as_str());
            }
            BookingCommand::AssignCleaner(Some(cleaner_id)) => {
                update.insert("cleaner_id", *cleaner_id);
            }
            BookingCommand::AssignCleaner(None) => {
                update.insert("cleaner_id", Bson::Null);
            }
        }
    }
}

/// Booking joined with customer contact, cleaner contact (when assigned),
/// service summary and payments.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub customer_id: String,
    pub cleaner_id: Option<String>,
    pub service_id: String,
    pub scheduled_at: chrono::DateTime<chrono::Utc>,
    pub duration: i32,
    pub total_price: f64,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub status: BookingStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub customer: ContactInfo,
    pub cleaner: Option<ContactInfo>,
    pub service: ServiceSummary,
    pub payments: Vec<PaymentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("DONE".parse::<BookingStatus>().is_err());
        assert!("in_progress".parse::<BookingStatus>().is_err());
    }

    fn create_dto(scheduled_at: &str) -> CreateBookingDto {
        CreateBookingDto {
            service_type: Some("HOME_CLEANING".to_string()),
            service_name: Some("Гэрийн цэвэрлэгээ".to_string()),
            scheduled_at: Some(scheduled_at.to_string()),
            address: Some("Сүхбаатар дүүрэг".to_string()),
            special_instructions: None,
            total_price: Some(25000.0),
            duration: None,
        }
    }

    #[test]
    fn creation_with_future_time_validates() {
        let now = chrono::Utc::now();
        let tomorrow = now + chrono::Duration::days(1);
        let valid = create_dto(&tomorrow.to_rfc3339()).validate(now).unwrap();

        assert_eq!(valid.service_type, crate::models::ServiceType::HomeCleaning);
        assert_eq!(valid.service_name, "Гэрийн цэвэрлэгээ");
        assert_eq!(valid.total_price, 25000.0);
        assert!(valid.scheduled_at > now);
    }

    #[test]
    fn creation_missing_required_field_is_rejected() {
        let now = chrono::Utc::now();
        let tomorrow = (now + chrono::Duration::days(1)).to_rfc3339();

        for strip in 0..5 {
            let mut dto = create_dto(&tomorrow);
            match strip {
                0 => dto.service_type = None,
                1 => dto.service_name = None,
                2 => dto.scheduled_at = None,
                3 => dto.address = None,
                _ => dto.total_price = None,
            }
            assert_eq!(
                dto.validate(now),
                Err("Missing required fields".to_string())
            );
        }
    }

    #[test]
    fn creation_in_the_past_is_rejected() {
        let now = chrono::Utc::now();
        let yesterday = (now - chrono::Duration::days(1)).to_rfc3339();
        assert_eq!(
            create_dto(&yesterday).validate(now),
            Err("Scheduled time must be in the future".to_string())
        );

        // Exactly "now" is not in the future either.
        assert_eq!(
            create_dto(&now.to_rfc3339()).validate(now),
            Err("Scheduled time must be in the future".to_string())
        );
    }

    #[test]
    fn creation_with_unparseable_time_is_rejected() {
        let now = chrono::Utc::now();
        assert_eq!(
            create_dto("tomorrow at noon").validate(now),
            Err("Invalid scheduled time".to_string())
        );
    }

    #[test]
    fn empty_patch_yields_no_commands() {
        let dto = AdminUpdateDto {
            status: None,
            cleaner_id: None,
        };
        assert_eq!(BookingCommand::from_admin_dto(&dto), Ok(Vec::new()));
    }

    #[test]
    fn status_and_assignment_parse_independently() {
        let cleaner_id = ObjectId::new();
        let dto = AdminUpdateDto {
            status: Some("CONFIRMED".to_string()),
            cleaner_id: Some(Some(cleaner_id.to_hex())),
        };
        let commands = BookingCommand::from_admin_dto(&dto).unwrap();
        assert_eq!(
            commands,
            vec![
                BookingCommand::SetStatus(BookingStatus::Confirmed),
                BookingCommand::AssignCleaner(Some(cleaner_id)),
            ]
        );
    }

    #[test]
    fn empty_cleaner_id_clears_assignment() {
        let dto = AdminUpdateDto {
            status: None,
            cleaner_id: Some(Some(String::new())),
        };
        let commands = BookingCommand::from_admin_dto(&dto).unwrap();
        assert_eq!(commands, vec![BookingCommand::AssignCleaner(None)]);

        let mut update = Document::new();
        commands[0].apply(&mut update);
        assert_eq!(update.get("cleaner_id"), Some(&Bson::Null));
    }

    #[test]
    fn explicit_null_cleaner_id_clears_assignment() {
        let dto: AdminUpdateDto = serde_json::from_str(r#"{ "cleanerId": null }"#).unwrap();
        assert_eq!(dto.cleaner_id, Some(None));
        assert_eq!(
            BookingCommand::from_admin_dto(&dto),
            Ok(vec![BookingCommand::AssignCleaner(None)])
        );
    }

    #[test]
    fn absent_cleaner_id_leaves_assignment_unchanged() {
        let dto: AdminUpdateDto = serde_json::from_str(r#"{ "status": "CONFIRMED" }"#).unwrap();
        assert_eq!(dto.cleaner_id, None);
        assert_eq!(
            BookingCommand::from_admin_dto(&dto),
            Ok(vec![BookingCommand::SetStatus(BookingStatus::Confirmed)])
        );
    }

    #[test]
    fn invalid_status_is_rejected() {
        let dto = AdminUpdateDto {
            status: Some("DELIVERED".to_string()),
            cleaner_id: None,
        };
        assert!(BookingCommand::from_admin_dto(&dto).is_err());
    }

    #[test]
    fn malformed_cleaner_id_is_rejected() {
        let dto = AdminUpdateDto {
            status: None,
            cleaner_id: Some(Some("not-an-object-id".to_string())),
        };
        assert_eq!(
            BookingCommand::from_admin_dto(&dto),
            Err("Invalid cleaner ID".to_string())
        );
    }

    #[test]
    fn commands_build_expected_update_document() {
        let cleaner_id = ObjectId::new();
        let mut update = Document::new();
        BookingCommand::SetStatus(BookingStatus::InProgress).apply(&mut update);
        BookingCommand::AssignCleaner(Some(cleaner_id)).apply(&mut update);

        assert_eq!(update.get_str("status"), Ok("IN_PROGRESS"));
        assert_eq!(update.get_object_id("cleaner_id"), Ok(cleaner_id));
    }
}
