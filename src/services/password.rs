use bcrypt::BcryptError;

/// Slow adaptive hash cost. Signup pays this on every registration.
const HASH_COST: u32 = 12;

pub fn hash_password(plain: &str) -> Result<String, BcryptError> {
    bcrypt::hash(plain, HASH_COST)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(plain, hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_against_hash() {
        // Low cost to keep the test fast; verify does not depend on cost.
        let hashed = bcrypt::hash("johndoe123", 4).unwrap();
        assert!(verify_password("johndoe123", &hashed).unwrap());
        assert!(!verify_password("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn rejects_garbage_hash() {
        assert!(verify_password("johndoe123", "not-a-bcrypt-hash").is_err());
    }
}
