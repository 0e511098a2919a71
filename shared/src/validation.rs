//! Validation utilities for the Cosmetic Inventory Management platform

/// Validate username format (3-32 chars, alphanumeric plus `._-`)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 32 {
        return Err("Username must be at most 32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err("Username may contain letters, digits, '.', '_' and '-' only");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a batch code: presence is the only requirement.
///
/// Legacy codes that predate the dated format are accepted everywhere;
/// production and expiry dates are derived downstream only when the code
/// happens to parse.
pub fn validate_batch_code(batch_code: &str) -> Result<(), &'static str> {
    if batch_code.trim().is_empty() {
        return Err("Batch code is required");
    }
    Ok(())
}

/// Validate a product or location display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.len() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("warehouse.kim").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn batch_code_rules() {
        assert!(validate_batch_code("4030").is_ok());
        // Undated legacy codes are legitimate; only absence is an error.
        assert!(validate_batch_code("LEGACY-01").is_ok());
        assert!(validate_batch_code("").is_err());
        assert!(validate_batch_code("   ").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("Hydrating Toner").is_ok());
        assert!(validate_name("   ").is_err());
    }
}
