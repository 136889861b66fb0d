/// Serde helpers for form, query-string and JSON deserialization.
///
/// HTML `<select>` elements with an empty `<option value="">` send an empty
/// string for the field, which cannot be parsed as an integer, while JSON
/// clients send real numbers. These helpers accept both and treat empty
/// strings as `None`.
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeI64 {
    Int(i64),
    Str(String),
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaybeI64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaybeI64::Int(v)) => Ok(Some(v)),
        Some(MaybeI64::Str(s)) => match s.trim() {
            "" => Ok(None),
            v => v.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        },
    }
}

/// Best-effort integer for query strings: anything unparsable becomes `None`
/// so a stale or hand-edited URL degrades to the defaults instead of
/// rejecting the request. JSON payload ids stay on the strict variant.
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaybeI64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaybeI64::Int(v)) => Ok(Some(v)),
        Some(MaybeI64::Str(s)) => Ok(s.trim().parse::<i64>().ok()),
    }
}

/// Empty or whitespace-only strings become `None`.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}
