//! Serde helpers for loosely typed request bodies.
//!
//! Shipment payloads come from storefront integrations that send numbers as
//! strings, phones as numbers and `null` wherever a value is unknown. These
//! helpers fold all of that into empty strings and absent numbers instead of
//! rejecting the request.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Any scalar becomes its textual form; `null`, arrays and objects become "".
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Numbers and numeric strings are accepted; everything else is absent.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `null` is read as an empty list.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` is read as the type's default.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Formats an amount the way it is printed on the forms: `98`, `2.5`.
pub fn format_amount(value: f64) -> String {
    if value == 0.0 {
        // avoids printing "-0"
        return "0".to_string();
    }
    format!("{}", value)
}
