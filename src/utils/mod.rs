pub mod response;
pub mod validation;

pub use response::ApiError;
pub use validation::validate_email;
