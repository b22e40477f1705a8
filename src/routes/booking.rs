use mongodb::Client;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use std::collections::HashMap;

use crate::db::DbConn;
use crate::guards::{AuthGuard, CustomerGuard};
use crate::models::{
    AdminUpdateDto, Booking, BookingCommand, BookingResponse, BookingStatus, ContactInfo,
    CreateBookingDto, Payment, PaymentResponse, Service, ServiceSummary, User, UserRole,
};
use crate::utils::ApiError;

/// Builds one joined response from prefetched lookup maps. Returns `None`
/// when the customer or service reference does not resolve.
fn assemble_booking(
    booking: Booking,
    users: &HashMap<ObjectId, ContactInfo>,
    services: &HashMap<ObjectId, ServiceSummary>,
    payments: &HashMap<ObjectId, Vec<PaymentResponse>>,
) -> Option<BookingResponse> {
    let customer = users.get(&booking.customer_id).cloned()?;
    let service = services.get(&booking.service_id).cloned()?;
    let cleaner = booking.cleaner_id.and_then(|id| users.get(&id).cloned());
    let booking_payments = booking
        .id
        .and_then(|id| payments.get(&id).cloned())
        .unwrap_or_default();

    Some(BookingResponse {
        id: booking.id.map(|id| id.to_hex()).unwrap_or_default(),
        customer_id: booking.customer_id.to_hex(),
        cleaner_id: booking.cleaner_id.map(|id| id.to_hex()),
        service_id: booking.service_id.to_hex(),
        scheduled_at: booking.scheduled_at.to_chrono(),
        duration: booking.duration,
        total_price: booking.total_price,
        address: booking.address,
        special_instructions: booking.special_instructions,
        status: booking.status,
        created_at: booking.created_at.to_chrono(),
        updated_at: booking.updated_at.to_chrono(),
        customer,
        cleaner,
        service,
        payments: booking_payments,
    })
}

/// Joins a batch of bookings with customer/cleaner contacts, service
/// summaries and payments using `$in` lookups, one query per collection.
pub(crate) async fn hydrate_bookings(
    db: &DbConn,
    bookings: Vec<Booking>,
) -> Result<Vec<BookingResponse>, ApiError> {
    if bookings.is_empty() {
        return Ok(Vec::new());
    }

    let mut user_ids = Vec::new();
    let mut service_ids = Vec::new();
    let mut booking_ids = Vec::new();
    for booking in &bookings {
        user_ids.push(booking.customer_id);
        if let Some(cleaner_id) = booking.cleaner_id {
            user_ids.push(cleaner_id);
        }
        service_ids.push(booking.service_id);
        if let Some(id) = booking.id {
            booking_ids.push(id);
        }
    }

    let mut users: HashMap<ObjectId, ContactInfo> = HashMap::new();
    let mut cursor = db
        .collection::<User>("users")
        .find(doc! { "_id": { "$in": user_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let user = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = user.id {
            users.insert(id, ContactInfo::from(&user));
        }
    }

    let mut services: HashMap<ObjectId, ServiceSummary> = HashMap::new();
    let mut cursor = db
        .collection::<Service>("services")
        .find(doc! { "_id": { "$in": service_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let service = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        if let Some(id) = service.id {
            services.insert(id, ServiceSummary::from(&service));
        }
    }

    let mut payments: HashMap<ObjectId, Vec<PaymentResponse>> = HashMap::new();
    let mut cursor = db
        .collection::<Payment>("payments")
        .find(doc! { "booking_id": { "$in": booking_ids } }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let payment = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        payments
            .entry(payment.booking_id)
            .or_default()
            .push(PaymentResponse::from(&payment));
    }

    // A dangling customer/service reference drops that row from the listing
    // rather than failing the whole response.
    Ok(bookings
        .into_iter()
        .filter_map(|booking| {
            let booking_id = booking.id;
            let response = assemble_booking(booking, &users, &services, &payments);
            if response.is_none() {
                log::warn!(
                    "skipping booking {:?} with dangling customer or service reference",
                    booking_id
                );
            }
            response
        })
        .collect())
}

pub(crate) async fn hydrate_booking(
    db: &DbConn,
    booking: Booking,
) -> Result<BookingResponse, ApiError> {
    hydrate_bookings(db, vec![booking])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_error("Failed to load booking"))
}

/// GET /bookings — role-scoped listing. Admins see everything newest-first,
/// cleaners see their assignments by schedule, customers see their own
/// bookings newest-first.
#[openapi(tag = "Bookings")]
#[get("/bookings")]
pub async fn get_bookings(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let (filter, sort) = match auth.role {
        UserRole::Admin => (doc! {}, doc! { "created_at": -1 }),
        UserRole::Cleaner => (doc! { "cleaner_id": auth.user_id }, doc! { "scheduled_at": 1 }),
        UserRole::Customer => (doc! { "customer_id": auth.user_id }, doc! { "created_at": -1 }),
    };

    let find_options = FindOptions::builder().sort(sort).build();
    let mut cursor = db
        .collection::<Booking>("bookings")
        .find(filter, find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let mut bookings = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?
    {
        let booking = cursor
            .deserialize_current()
            .map_err(|e| ApiError::internal_error(format!("Deserialization error: {}", e)))?;
        bookings.push(booking);
    }

    Ok(Json(hydrate_bookings(db, bookings).await?))
}

#[post("/bookings", data = "<dto>")]
pub async fn create_booking(
    db: &State<DbConn>,
    customer: CustomerGuard,
    dto: Json<CreateBookingDto>,
) -> Result<(Status, Json<BookingResponse>), ApiError> {
    let valid = dto
        .validate(chrono::Utc::now())
        .map_err(ApiError::bad_request)?;

    // Create or find the catalog service for this (type, name) pair.
    let services = db.collection::<Service>("services");
    let service = services
        .find_one(
            doc! { "type": valid.service_type.as_str(), "name": &valid.service_name },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    let service = match service {
        Some(service) => service,
        None => {
            let mut service = Service::from_booking_request(
                valid.service_type,
                &valid.service_name,
                valid.total_price,
                dto.duration,
            );
            let result = services
                .insert_one(&service, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to create service: {}", e)))?;
            service.id = result.inserted_id.as_object_id();
            service
        }
    };

    let mut booking = Booking {
        id: None,
        customer_id: customer.auth.user_id,
        cleaner_id: None,
        service_id: service
            .id
            .ok_or_else(|| ApiError::internal_error("Service missing ID"))?,
        scheduled_at: DateTime::from_chrono(valid.scheduled_at),
        duration: dto.duration.unwrap_or(service.duration),
        // The caller's price is authoritative for this booking, even when a
        // matching catalog row carries a different base price.
        total_price: valid.total_price,
        address: valid.address,
        special_instructions: dto.special_instructions.clone(),
        status: BookingStatus::Pending,
        created_at: DateTime::now(),
        updated_at: DateTime::now(),
    };

    let result = db
        .collection::<Booking>("bookings")
        .insert_one(&booking, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create booking: {}", e)))?;
    booking.id = result.inserted_id.as_object_id();

    let response = hydrate_booking(db, booking).await?;
    Ok((Status::Created, Json(response)))
}

/// PATCH /bookings/<id> — admin-only. Status may be set to any value and the
/// cleaner assignment changed or cleared, independently or together.
#[openapi(tag = "Bookings")]
#[patch("/bookings/<booking_id>", data = "<dto>")]
pub async fn update_booking(
    db: &State<DbConn>,
    auth: AuthGuard,
    booking_id: String,
    dto: Json<AdminUpdateDto>,
) -> Result<Json<BookingResponse>, ApiError> {
    let object_id =
        ObjectId::parse_str(&booking_id).map_err(|_| ApiError::not_found("Booking not found"))?;

    let bookings = db.collection::<Booking>("bookings");

    // 404 takes precedence over 403 on this route.
    if bookings
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .is_none()
    {
        return Err(ApiError::not_found("Booking not found"));
    }

    if auth.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    let commands = BookingCommand::from_admin_dto(&dto).map_err(ApiError::bad_request)?;

    let mut update = doc! { "updated_at": DateTime::now() };
    for command in &commands {
        if let BookingCommand::AssignCleaner(Some(cleaner_id)) = command {
            let cleaner = db
                .collection::<User>("users")
                .find_one(doc! { "_id": *cleaner_id }, None)
                .await
                .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;
            match cleaner {
                Some(user) if user.role == UserRole::Cleaner => {}
                _ => return Err(ApiError::bad_request("Assigned user is not a cleaner")),
            }
        }
        command.apply(&mut update);
    }

    bookings
        .update_one(doc! { "_id": object_id }, doc! { "$set": update }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update booking: {}", e)))?;

    let updated = bookings
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(hydrate_booking(db, updated).await?))
}

/// DELETE /bookings/<id> — admin-only. Payments and the booking are removed
/// in a single session transaction.
#[openapi(tag = "Bookings")]
#[delete("/bookings/<booking_id>")]
pub async fn delete_booking(
    db: &State<DbConn>,
    client: &State<Client>,
    auth: AuthGuard,
    booking_id: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id =
        ObjectId::parse_str(&booking_id).map_err(|_| ApiError::not_found("Booking not found"))?;

    if db
        .collection::<Booking>("bookings")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .is_none()
    {
        return Err(ApiError::not_found("Booking not found"));
    }

    if auth.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    let mut session = client
        .start_session(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session error: {}", e)))?;
    session
        .start_transaction(None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Transaction error: {}", e)))?;

    let result: Result<(), mongodb::error::Error> = async {
        db.collection::<Payment>("payments")
            .delete_many_with_session(doc! { "booking_id": object_id }, None, &mut session)
            .await?;
        db.collection::<Booking>("bookings")
            .delete_one_with_session(doc! { "_id": object_id }, None, &mut session)
            .await?;
        Ok(())
    }
    .await;

    match result {
        Ok(()) => {
            session
                .commit_transaction()
                .await
                .map_err(|e| ApiError::internal_error(format!("Failed to delete booking: {}", e)))?;
        }
        Err(e) => {
            session.abort_transaction().await.ok();
            return Err(ApiError::internal_error(format!(
                "Failed to delete booking: {}",
                e
            )));
        }
    }

    Ok(Json(serde_json::json!({
        "message": "Booking deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceType;

    fn sample_booking(customer_id: ObjectId, service_id: ObjectId) -> Booking {
        Booking {
            id: Some(ObjectId::new()),
            customer_id,
            cleaner_id: None,
            service_id,
            scheduled_at: DateTime::now(),
            duration: 120,
            total_price: 25000.0,
            address: "Сүхбаатар дүүрэг".to_string(),
            special_instructions: None,
            status: BookingStatus::Pending,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    fn contact(id: ObjectId) -> ContactInfo {
        ContactInfo {
            id: id.to_hex(),
            full_name: "Бат Болд".to_string(),
            email: "customer@test.com".to_string(),
            phone: "99112233".to_string(),
        }
    }

    #[test]
    fn assembles_joined_booking() {
        let customer_id = ObjectId::new();
        let service_id = ObjectId::new();
        let booking = sample_booking(customer_id, service_id);

        let users = HashMap::from([(customer_id, contact(customer_id))]);
        let services = HashMap::from([(
            service_id,
            ServiceSummary {
                id: service_id.to_hex(),
                name: "Гэрийн цэвэрлэгээ".to_string(),
                service_type: ServiceType::HomeCleaning,
            },
        )]);
        let payments = HashMap::new();

        let response = assemble_booking(booking, &users, &services, &payments).unwrap();
        assert_eq!(response.customer.id, customer_id.to_hex());
        assert_eq!(response.service.name, "Гэрийн цэвэрлэгээ");
        assert!(response.cleaner.is_none());
        assert!(response.payments.is_empty());
        assert_eq!(response.status, BookingStatus::Pending);
    }

    #[test]
    fn dangling_reference_drops_the_row() {
        let customer_id = ObjectId::new();
        let service_id = ObjectId::new();

        // Customer missing from the lookup.
        let services = HashMap::from([(
            service_id,
            ServiceSummary {
                id: service_id.to_hex(),
                name: "Гэрийн цэвэрлэгээ".to_string(),
                service_type: ServiceType::HomeCleaning,
            },
        )]);
        let booking = sample_booking(customer_id, service_id);
        assert!(assemble_booking(booking, &HashMap::new(), &services, &HashMap::new()).is_none());

        // Service missing from the lookup.
        let users = HashMap::from([(customer_id, contact(customer_id))]);
        let booking = sample_booking(customer_id, service_id);
        assert!(assemble_booking(booking, &users, &HashMap::new(), &HashMap::new()).is_none());
    }
}
