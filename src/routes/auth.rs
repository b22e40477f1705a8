use mongodb::bson::{DateTime, doc};
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;

use crate::config::AuthConfig;
use crate::db::DbConn;
use crate::models::{SigninDto, SignupDto, User, UserResponse, UserRole};
use crate::services::{JwtService, hash_password, verify_password};
use crate::utils::{ApiError, validate_email};

/// --------------------
/// Signup
/// --------------------
#[post("/signup", data = "<dto>")]
pub async fn signup(
    db: &State<DbConn>,
    dto: Json<SignupDto>,
) -> Result<(Status, Json<serde_json::Value>), ApiError> {
    let (Some(email), Some(password), Some(full_name), Some(phone)) = (
        dto.email.as_deref(),
        dto.password.as_deref(),
        dto.full_name.as_deref(),
        dto.phone.as_deref(),
    ) else {
        return Err(ApiError::bad_request(
            "Имэйл, нууц үг, нэр, утасны дугаар шаардлагатай",
        ));
    };

    if !validate_email(email) {
        return Err(ApiError::bad_request("Имэйл хаяг буруу байна"));
    }

    let users = db.collection::<User>("users");
    if users
        .find_one(doc! { "email": email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .is_some()
    {
        return Err(ApiError::conflict(
            "Энэ имэйл хаягаар бүртгэгдсэн хэрэглэгч байна",
        ));
    }

    // Admin accounts are provisioned separately, never through signup.
    // Unknown or missing roles fall back to customer.
    let role = match dto.role.as_deref().map(str::parse::<UserRole>) {
        Some(Ok(UserRole::Admin)) => {
            return Err(ApiError::bad_request(
                "Админ эрхээр бүртгүүлэх боломжгүй",
            ));
        }
        Some(Ok(role)) => role,
        _ => UserRole::Customer,
    };

    let hashed = hash_password(password)
        .map_err(|e| ApiError::internal_error(format!("Hashing error: {}", e)))?;

    let mut user = User {
        id: None,
        email: email.to_string(),
        password: hashed,
        full_name: full_name.to_string(),
        phone: phone.to_string(),
        role,
        address: dto.address.clone(),
        is_active: true,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = users
        .insert_one(&user, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create user: {}", e)))?;
    user.id = result.inserted_id.as_object_id();

    Ok((
        Status::Created,
        Json(serde_json::json!({
            "message": "Амжилттай бүртгэгдлээ",
            "user": UserResponse::from(user),
        })),
    ))
}

/// --------------------
/// Signin
/// --------------------
#[post("/signin", data = "<dto>")]
pub async fn signin(
    db: &State<DbConn>,
    config: &State<AuthConfig>,
    dto: Json<SigninDto>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (Some(email), Some(password)) = (dto.email.as_deref(), dto.password.as_deref()) else {
        return Err(ApiError::bad_request("Имэйл болон нууц үг шаардлагатай"));
    };

    let user = db
        .collection::<User>("users")
        .find_one(doc! { "email": email }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => {
            return Err(ApiError::unauthorized(
                "Хэрэглэгч олдсонгүй эсвэл идэвхгүй байна",
            ));
        }
    };

    let password_valid = verify_password(password, &user.password)
        .map_err(|e| ApiError::internal_error(format!("Hashing error: {}", e)))?;
    if !password_valid {
        return Err(ApiError::unauthorized("Буруу нууц үг"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("User missing ID"))?;
    let token = JwtService::generate_token(config, &user_id, &user.email, user.role)
        .map_err(|e| ApiError::internal_error(format!("Token error: {}", e)))?;

    Ok(Json(serde_json::json!({
        "token": token,
        "user": UserResponse::from(user),
    })))
}
