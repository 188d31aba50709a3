use std::{fmt::Display, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a value of type `T` from an optional string. `Err` carries the offending input so that callers can log it
/// before falling back to a default.
pub fn parse_value<T>(value: Option<String>) -> Option<Result<T, String>>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|v| v.trim().parse::<T>().map_err(|e| format!("'{v}' ({e})")))
}
