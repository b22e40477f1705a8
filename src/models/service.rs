use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default duration for a service created on first booking, in minutes.
pub const DEFAULT_SERVICE_DURATION: i32 = 120;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    HomeCleaning,
    OfficeCleaning,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::HomeCleaning => "HOME_CLEANING",
            ServiceType::OfficeCleaning => "OFFICE_CLEANING",
        }
    }

    pub fn default_name_en(&self) -> &'static str {
        match self {
            ServiceType::HomeCleaning => "Home Cleaning",
            ServiceType::OfficeCleaning => "Office Cleaning",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            ServiceType::HomeCleaning => {
                "Таны гэрийг гялалзуулж, эрүүл ахуйн стандартыг дээшлүүлье"
            }
            ServiceType::OfficeCleaning => {
                "Таны ажлын орчинд мэргэжлийн цэвэрлэгээний үйлчилгээ"
            }
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOME_CLEANING" => Ok(ServiceType::HomeCleaning),
            "OFFICE_CLEANING" => Ok(ServiceType::OfficeCleaning),
            _ => Err(()),
        }
    }
}

/// Catalog entry, keyed in practice by `(type, name)`. Created at seed time
/// or on demand when a booking names a pair not yet in the catalog.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub name_en: String,
    pub description: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub base_price: f64,
    pub duration: i32,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Service {
    /// Catalog row synthesized for a `(type, name)` pair seen for the first
    /// time. The base price is the caller's total price; the stored base
    /// price never feeds back into later bookings.
    pub fn from_booking_request(
        service_type: ServiceType,
        name: &str,
        base_price: f64,
        duration: Option<i32>,
    ) -> Self {
        Service {
            id: None,
            name: name.to_string(),
            name_en: service_type.default_name_en().to_string(),
            description: service_type.default_description().to_string(),
            service_type,
            base_price,
            duration: duration.unwrap_or(DEFAULT_SERVICE_DURATION),
            is_active: true,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Serialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        ServiceSummary {
            id: service.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: service.name.clone(),
            service_type: service.service_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_parses_wire_names() {
        assert_eq!(
            "HOME_CLEANING".parse::<ServiceType>(),
            Ok(ServiceType::HomeCleaning)
        );
        assert_eq!(
            "OFFICE_CLEANING".parse::<ServiceType>(),
            Ok(ServiceType::OfficeCleaning)
        );
        assert!("WINDOW_CLEANING".parse::<ServiceType>().is_err());
    }

    #[test]
    fn synthesized_service_uses_type_defaults() {
        let service = Service::from_booking_request(
            ServiceType::HomeCleaning,
            "Гэрийн цэвэрлэгээ",
            25000.0,
            None,
        );
        assert_eq!(service.name_en, "Home Cleaning");
        assert_eq!(service.duration, DEFAULT_SERVICE_DURATION);
        assert_eq!(service.base_price, 25000.0);
        assert!(service.is_active);

        let office = Service::from_booking_request(
            ServiceType::OfficeCleaning,
            "Оффис цэвэрлэгээ",
            40000.0,
            Some(180),
        );
        assert_eq!(office.name_en, "Office Cleaning");
        assert_eq!(office.duration, 180);
    }
}
