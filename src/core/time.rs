use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Formats a backend timestamp as `YYYY-MM-DD HH:MM` (UTC).
///
/// Accepts RFC 3339 and naive ISO timestamps (treated as UTC, fractional
/// seconds ignored). Anything else is returned unchanged.
pub(crate) fn format_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();

    let parsed = OffsetDateTime::parse(trimmed, &Rfc3339)
        .map(|value| value.to_offset(UtcOffset::UTC))
        .ok()
        .or_else(|| parse_naive(trimmed).map(PrimitiveDateTime::assume_utc));

    let display = format_description!("[year]-[month]-[day] [hour]:[minute]");
    match parsed.and_then(|value| value.format(&display).ok()) {
        Some(formatted) => formatted,
        None => trimmed.to_string(),
    }
}

fn parse_naive(raw: &str) -> Option<PrimitiveDateTime> {
    let without_fraction = raw.split('.').next().unwrap_or(raw);
    let iso = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let spaced = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(without_fraction, &iso)
        .or_else(|_| PrimitiveDateTime::parse(without_fraction, &spaced))
        .ok()
}
