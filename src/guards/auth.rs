use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::config::AuthConfig;
use crate::models::UserRole;
use crate::services::JwtService;

/// Only `Bearer`-scheme headers carry a token; anything else falls through
/// to the cookie lookup.
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// JWT-based authentication guard. Accepts the token from the
/// `Authorization: Bearer` header or the `token` cookie.
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<AuthConfig>() else {
            return Outcome::Error((Status::InternalServerError, ()));
        };

        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(bearer_token)
            .map(str::to_string)
            .or_else(|| req.cookies().get("token").map(|c| c.value().to_string()));

        match token {
            Some(token) => match JwtService::verify_token(config, &token) {
                Ok(claims) => match ObjectId::parse_str(&claims.sub) {
                    Ok(user_id) => Outcome::Success(AuthGuard {
                        user_id,
                        email: claims.email,
                        role: claims.role,
                    }),
                    Err(_) => Outcome::Error((Status::Unauthorized, ())),
                },
                Err(_) => Outcome::Error((Status::Unauthorized, ())),
            },
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// === OpenAPI Integration (Fallback for older versions) ===
/// Keeps OpenAPI generation working even without new traits.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        // The guard doesn't contribute any special header/parameter for docs
        Ok(RequestHeaderInput::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_scheme_prefix() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("bearer abc.def.ghi"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
    }
}
