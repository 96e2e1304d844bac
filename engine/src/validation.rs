use bigdecimal::BigDecimal;
use common::{money, EngineError};
use std::collections::HashMap;
use store::Side;

pub struct SubmitOrderInput {
    pub symbol: String,
    pub side: Side,
    pub price: BigDecimal,
    pub amount: BigDecimal,
}

/// Validates a raw order submission per the normative field rules, collecting
/// every violation into one field-keyed map rather than failing fast on the
/// first (matches the `422 {errors}` response shape at the HTTP edge).
pub fn validate_submit_order(
    symbol: &str,
    side: &str,
    price: &str,
    amount: &str,
) -> Result<SubmitOrderInput, EngineError> {
    let mut errors: HashMap<String, String> = HashMap::new();

    if symbol.is_empty() {
        errors.insert("symbol".to_string(), "symbol is required".to_string());
    } else if symbol.len() > 10 {
        errors.insert(
            "symbol".to_string(),
            "symbol must be at most 10 characters".to_string(),
        );
    }

    let parsed_side = match Side::from_str(side) {
        Ok(s) => Some(s),
        Err(_) => {
            errors.insert(
                "side".to_string(),
                "side must be 'buy' or 'sell'".to_string(),
            );
            None
        }
    };

    let parsed_price = match money::parse(price) {
        Ok(p) if money::is_positive(&p) => Some(p),
        Ok(_) => {
            errors.insert("price".to_string(), "price must be > 0".to_string());
            None
        }
        Err(_) => {
            errors.insert("price".to_string(), "price must be numeric".to_string());
            None
        }
    };

    let parsed_amount = match money::parse(amount) {
        Ok(a) if money::is_positive(&a) => Some(a),
        Ok(_) => {
            errors.insert("amount".to_string(), "amount must be > 0".to_string());
            None
        }
        Err(_) => {
            errors.insert("amount".to_string(), "amount must be numeric".to_string());
            None
        }
    };

    if !errors.is_empty() {
        return Err(EngineError::Validation(errors));
    }

    Ok(SubmitOrderInput {
        symbol: symbol.to_string(),
        side: parsed_side.expect("checked above"),
        price: parsed_price.expect("checked above"),
        amount: parsed_amount.expect("checked above"),
    })
}
