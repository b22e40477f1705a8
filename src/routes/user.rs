use mongodb::bson::doc;
use mongodb::options::FindOptions;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AdminGuard;
use crate::models::{Booking, User, UserCounts, UserResponse, UserWithCounts};
use crate::utils::ApiError;

/// GET /users — admin-only listing with per-user booking counts.
#[openapi(tag = "Users")]
#[get("/users")]
pub async fn get_users(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<Vec<UserWithCounts>>, ApiError> {
    let find_options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();

    let mut cursor = db
        .collection::<User>("users")
        .find(doc! {}, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut users = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let user = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        users.push(user);
    }

    let bookings = db.collection::<Booking>("bookings");
    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        let Some(user_id) = user.id else { continue };

        let owned = bookings
            .count_documents(doc! { "customer_id": user_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;
        let assigned = bookings
            .count_documents(doc! { "cleaner_id": user_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

        rows.push(UserWithCounts {
            user: UserResponse::from(user),
            count: UserCounts {
                bookings: owned,
                assigned_bookings: assigned,
            },
        });
    }

    Ok(Json(rows))
}
