use rust_decimal::Decimal;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// International format: leading `+`, then 7 to 15 digits. Spaces and dashes are allowed.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let Some(rest) = phone.trim().strip_prefix('+') else {
        return Err(invalid("phone", "phone must be in international format"));
    };
    if !rest.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err(invalid("phone", "phone must be in international format"));
    }
    let digits = rest.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(invalid("phone", "phone must be in international format"));
    }
    Ok(())
}

/// `+` followed by digits only.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("+{digits}")
}

pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(invalid("price", "price must not be negative"));
    }
    Ok(())
}

pub fn validate_discount(discount: &Decimal) -> Result<(), ValidationError> {
    if discount.is_sign_negative() || *discount > Decimal::ONE_HUNDRED {
        return Err(invalid("discount", "discount must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_international_numbers() {
        assert!(validate_phone("+14155552671").is_ok());
        assert!(validate_phone("+44 20-7946-0958").is_ok());
    }

    #[test]
    fn rejects_local_or_garbled_numbers() {
        assert!(validate_phone("4155552671").is_err());
        assert!(validate_phone("+1(415)555").is_err());
        assert!(validate_phone("+123").is_err());
    }

    #[test]
    fn normalizes_to_digits() {
        assert_eq!(normalize_phone("+44 20-7946-0958"), "+442079460958");
    }

    #[test]
    fn discount_bounds() {
        assert!(validate_discount(&Decimal::ZERO).is_ok());
        assert!(validate_discount(&Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_discount(&Decimal::new(1001, 1)).is_err());
        assert!(validate_discount(&Decimal::NEGATIVE_ONE).is_err());
        assert!(validate_price(&Decimal::NEGATIVE_ONE).is_err());
    }
}
