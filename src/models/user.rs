use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Customer,
    Cleaner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Customer => "CUSTOMER",
            UserRole::Cleaner => "CLEANER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "CUSTOMER" => Ok(UserRole::Customer),
            "CLEANER" => Ok(UserRole::Cleaner),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupDto {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SigninDto {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User as returned to clients. The password hash never leaves the server.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            address: user.address,
            is_active: user.is_active,
            created_at: user.created_at.to_chrono(),
        }
    }
}

/// Contact fields embedded in booking responses.
#[derive(Debug, Serialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for ContactInfo {
    fn from(user: &User) -> Self {
        ContactInfo {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub bookings: u64,
    pub assigned_bookings: u64,
}

/// Row of the admin user listing: the sanitized user plus how many bookings
/// they own and how many are assigned to them.
#[derive(Debug, Serialize, JsonSchema)]
pub struct UserWithCounts {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(rename = "_count")]
    pub count: UserCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::new()),
            email: "customer@test.com".to_string(),
            password: "$2b$12$secret-hash".to_string(),
            full_name: "Бат Болд".to_string(),
            phone: "99112233".to_string(),
            role: UserRole::Customer,
            address: Some("Улаанбаатар".to_string()),
            is_active: true,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn role_parses_uppercase_names() {
        for role in [UserRole::Admin, UserRole::Customer, UserRole::Cleaner] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("admin".parse::<UserRole>().is_err());
        assert!("MANAGER".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_serializes_as_uppercase_string() {
        let value = serde_json::to_value(UserRole::Cleaner).unwrap();
        assert_eq!(value, serde_json::json!("CLEANER"));
    }

    #[test]
    fn user_response_strips_password() {
        let response = UserResponse::from(sample_user());
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "customer@test.com");
        assert_eq!(value["fullName"], "Бат Болд");
        assert_eq!(value["role"], "CUSTOMER");
    }

    #[test]
    fn user_counts_serialize_under_count_key() {
        let row = UserWithCounts {
            user: UserResponse::from(sample_user()),
            count: UserCounts {
                bookings: 3,
                assigned_bookings: 0,
            },
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["_count"]["bookings"], 3);
        assert_eq!(value["_count"]["assignedBookings"], 0);
    }
}
