use mongodb::bson::{DateTime, doc, oid::ObjectId};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::config::TransitionPolicy;
use crate::db::DbConn;
use crate::guards::CleanerGuard;
use crate::models::{Booking, BookingResponse, BookingStatus, CleanerUpdateDto};
use crate::routes::booking::hydrate_booking;
use crate::utils::ApiError;

/// PATCH /cleaner/bookings/<id> — the assigned cleaner moves a booking into
/// one of the policy-allowed statuses (IN_PROGRESS or COMPLETED by default).
#[openapi(tag = "Cleaner")]
#[patch("/cleaner/bookings/<booking_id>", data = "<dto>")]
pub async fn update_booking_status(
    db: &State<DbConn>,
    policy: &State<TransitionPolicy>,
    cleaner: CleanerGuard,
    booking_id: String,
    dto: Json<CleanerUpdateDto>,
) -> Result<Json<BookingResponse>, ApiError> {
    let object_id =
        ObjectId::parse_str(&booking_id).map_err(|_| ApiError::not_found("Booking not found"))?;

    let bookings = db.collection::<Booking>("bookings");
    let booking = bookings
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if booking.cleaner_id != Some(cleaner.auth.user_id) {
        return Err(ApiError::forbidden("Not assigned to this booking"));
    }

    let status: BookingStatus = dto
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status transition"))?;
    if !policy.allows(status) {
        return Err(ApiError::bad_request("Invalid status transition"));
    }

    bookings
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": status.as_str(), "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update booking: {}", e)))?;

    let updated = bookings
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(hydrate_booking(db, updated).await?))
}
