//! Email and password rules.

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Lower-case and trim an email address for lookups and storage.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Loose shape check: `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// At least [`MIN_PASSWORD_LEN`] characters with an upper-case letter, a lower-case letter
/// and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}
