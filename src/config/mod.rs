use rocket::Config as RocketConfig;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::env;

use crate::models::BookingStatus;

/// JWT signing settings, resolved once at launch and handed to the auth
/// guard through Rocket's managed state rather than read from a global.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry: i64,
}

/// Statuses a cleaner may move an assigned booking into. The original
/// product allows jumping straight to COMPLETED without passing through
/// IN_PROGRESS, so the set is policy, not a state machine.
#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    pub cleaner_statuses: Vec<BookingStatus>,
}

impl TransitionPolicy {
    pub fn allows(&self, status: BookingStatus) -> bool {
        self.cleaner_statuses.contains(&status)
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        TransitionPolicy {
            cleaner_statuses: vec![BookingStatus::InProgress, BookingStatus::Completed],
        }
    }
}

pub struct Config;

impl Config {
    fn figment() -> Figment {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    pub fn auth() -> AuthConfig {
        let figment = Self::figment();
        AuthConfig {
            jwt_secret: figment
                .extract_inner("jwt_secret")
                .unwrap_or_else(|_| "default-secret".to_string()),
            jwt_expiry: figment.extract_inner("jwt_expiry").unwrap_or(86400),
        }
    }

    pub fn transition_policy() -> TransitionPolicy {
        let names: Vec<String> = match Self::figment().extract_inner("cleaner_statuses") {
            Ok(names) => names,
            Err(_) => return TransitionPolicy::default(),
        };

        let cleaner_statuses: Vec<BookingStatus> =
            names.iter().filter_map(|name| name.parse().ok()).collect();

        if cleaner_statuses.is_empty() {
            TransitionPolicy::default()
        } else {
            TransitionPolicy { cleaner_statuses }
        }
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017/cleanhub".to_string())
    }

    pub fn database_name() -> String {
        Self::figment()
            .extract_inner("database_name")
            .unwrap_or_else(|_| "cleanhub".to_string())
    }
}
