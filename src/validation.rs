use bigdecimal::BigDecimal;
use std::fmt;

pub const NAME_MAX_LEN: usize = 120;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const ADDRESS_MAX_LEN: usize = 500;
pub const DOC_REF_MAX_LEN: usize = 255;
pub const MAX_SALE_QUANTITY: i32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub type FieldResult = Result<(), FieldError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> FieldResult {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> FieldResult {
    if value.len() > max_len {
        return Err(FieldError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_email(field: &'static str, value: &str) -> FieldResult {
    let value = sanitize_string(value);
    validate_required(field, &value)?;
    validate_max_len(field, &value, EMAIL_MAX_LEN)?;

    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || value.contains(' ') {
        return Err(FieldError::new(field, "must be a valid email address"));
    }

    Ok(())
}

pub fn validate_password(field: &'static str, value: &str) -> FieldResult {
    if value.len() < PASSWORD_MIN_LEN {
        return Err(FieldError::new(
            field,
            format!("must be at least {} characters", PASSWORD_MIN_LEN),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> FieldResult {
    if amount <= &BigDecimal::from(0) {
        return Err(FieldError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_quantity(field: &'static str, quantity: i32) -> FieldResult {
    if quantity < 1 {
        return Err(FieldError::new(field, "must be at least 1"));
    }

    if quantity > MAX_SALE_QUANTITY {
        return Err(FieldError::new(
            field,
            format!("must be at most {}", MAX_SALE_QUANTITY),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_email() {
        assert!(validate_email("email", "jane@example.com").is_ok());
        assert!(validate_email("email", "  jane@example.com  ").is_ok());
        assert!(validate_email("email", "jane").is_err());
        assert!(validate_email("email", "jane@").is_err());
        assert!(validate_email("email", "@example.com").is_err());
        assert!(validate_email("email", "jane@nodot").is_err());
        assert!(validate_email("email", "").is_err());
    }

    #[test]
    fn validates_password_length() {
        assert!(validate_password("password", "longenough").is_ok());
        assert!(validate_password("password", "short").is_err());
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("amount", &positive).is_ok());
        assert!(validate_positive_amount("amount", &zero).is_err());
        assert!(validate_positive_amount("amount", &negative).is_err());
    }

    #[test]
    fn validates_quantity_bounds() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -2).is_err());
        assert!(validate_quantity("quantity", MAX_SALE_QUANTITY + 1).is_err());
    }
}
