use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Canonical form of an email used as the join key between `users` and
/// `premiumUsers`. Only case is folded; surrounding whitespace is kept.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
