use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::models::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_token(
        config: &AuthConfig,
        user_id: &ObjectId,
        email: &str,
        role: UserRole,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            email: email.to_string(),
            role,
            exp: now + config.jwt_expiry,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
    }

    pub fn verify_token(
        config: &AuthConfig,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            jwt_expiry: 3600,
        }
    }

    #[test]
    fn token_round_trips_identity_and_role() {
        let config = test_config();
        let user_id = ObjectId::new();

        let token =
            JwtService::generate_token(&config, &user_id, "cleaner@test.com", UserRole::Cleaner)
                .unwrap();
        let claims = JwtService::verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.email, "cleaner@test.com");
        assert_eq!(claims.role, UserRole::Cleaner);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let other = AuthConfig {
            jwt_secret: "another-secret".to_string(),
            jwt_expiry: 3600,
        };
        let user_id = ObjectId::new();

        let token =
            JwtService::generate_token(&other, &user_id, "admin@test.com", UserRole::Admin)
                .unwrap();
        assert!(JwtService::verify_token(&config, &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            jwt_expiry: -7200,
        };
        let user_id = ObjectId::new();

        let token =
            JwtService::generate_token(&config, &user_id, "customer@test.com", UserRole::Customer)
                .unwrap();
        assert!(JwtService::verify_token(&config, &token).is_err());
    }
}
