//! Merchant (tenant) identifiers.

/// Minimum and maximum merchant code length.
pub const MERCHANT_CODE_LEN: std::ops::RangeInclusive<usize> = 3..=20;

/// Normalize a merchant code: trim, upper-case, and accept only `[A-Z0-9]{3,20}`.
pub fn normalize_merchant_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = MERCHANT_CODE_LEN.contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    valid.then_some(code)
}
