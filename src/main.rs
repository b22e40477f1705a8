#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(401)]
fn unauthorized() -> Value {
    json!({ "error": "Authentication required" })
}

#[catch(403)]
fn forbidden() -> Value {
    json!({ "error": "Forbidden" })
}

#[catch(404)]
fn not_found() -> Value {
    json!({ "error": "Resource not found" })
}

// Rocket answers 422 for undeserializable JSON; the API contract is 400.
#[catch(422)]
fn unprocessable() -> status::Custom<Json<Value>> {
    status::Custom(
        Status::BadRequest,
        Json(json!({ "error": "Invalid request body" })),
    )
}

#[catch(500)]
fn internal_error() -> Value {
    json!({ "error": "Server error" })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    println!("🧹 CleanHub API running");
    println!("📚 Swagger UI → http://localhost:8000/api/docs");

    rocket::build()
        .attach(db::init())
        .attach(CORS)
        .manage(config::Config::auth())
        .manage(config::Config::transition_policy())
        .mount("/", routes![options_handler])
        .mount(
            "/",
            routes![
                // Identity
                routes::auth::signup,
                routes::auth::signin,
                // Bookings
                routes::booking::get_bookings,
                routes::booking::create_booking,
                routes::booking::update_booking,
                routes::booking::delete_booking,
                // Cleaner
                routes::cleaner::update_booking_status,
                // Users
                routes::user::get_users,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
}
