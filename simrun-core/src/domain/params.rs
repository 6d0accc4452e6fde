//! Simulation parameters
//!
//! Incoming form data is an arbitrary JSON object. Normalization is
//! permissive: unknown keys pass through untouched and structural validation
//! is left to the external simulation.

use serde_json::{Map, Value as JsonValue};

/// Ordered mapping from parameter name to value.
///
/// Insertion order is preserved (`serde_json` is built with `preserve_order`),
/// so the rendered document lists keys in the order they were submitted.
pub type Parameters = Map<String, JsonValue>;

/// Parameter that the simulation reads as a float and must never see as a bare integer
pub const DISCOUNT_RATE: &str = "discount_rate";

/// Normalizes submitted parameters into their canonical configuration shape.
///
/// An integral `discount_rate` becomes a float (`5` → `5.0`). Every other
/// entry, including non-integral numbers and unknown keys, is kept as is.
pub fn normalize(mut params: Parameters) -> Parameters {
    for (key, value) in params.iter_mut() {
        if key == DISCOUNT_RATE {
            if let Some(coerced) = integer_as_float(value) {
                *value = coerced;
            }
        }
    }
    params
}

fn integer_as_float(value: &JsonValue) -> Option<JsonValue> {
    let JsonValue::Number(number) = value else {
        return None;
    };

    let float = if let Some(n) = number.as_i64() {
        n as f64
    } else if let Some(n) = number.as_u64() {
        n as f64
    } else {
        return None;
    };

    serde_json::Number::from_f64(float).map(JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: JsonValue) -> Parameters {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_integer_discount_rate_becomes_float() {
        let normalized = normalize(params(json!({"discount_rate": 5})));
        let value = &normalized[DISCOUNT_RATE];
        assert!(value.is_f64());
        assert_eq!(value.as_f64(), Some(5.0));
    }

    #[test]
    fn test_negative_and_zero_discount_rate() {
        let normalized = normalize(params(json!({"discount_rate": 0})));
        assert!(normalized[DISCOUNT_RATE].is_f64());

        let normalized = normalize(params(json!({"discount_rate": -3})));
        assert_eq!(normalized[DISCOUNT_RATE].as_f64(), Some(-3.0));
    }

    #[test]
    fn test_float_discount_rate_unchanged() {
        let normalized = normalize(params(json!({"discount_rate": 0.05})));
        assert_eq!(normalized[DISCOUNT_RATE], json!(0.05));
    }

    #[test]
    fn test_non_numeric_discount_rate_passes_through() {
        let normalized = normalize(params(json!({"discount_rate": "5"})));
        assert_eq!(normalized[DISCOUNT_RATE], json!("5"));
    }

    #[test]
    fn test_other_integers_untouched() {
        let normalized = normalize(params(json!({"horizon": 24, "discount": 5})));
        assert!(normalized["horizon"].is_u64());
        assert!(normalized["discount"].is_u64());
    }

    #[test]
    fn test_key_order_preserved() {
        let normalized = normalize(params(json!({
            "zeta": 1,
            "discount_rate": 2,
            "alpha": "x",
        })));
        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "discount_rate", "alpha"]);
    }
}
