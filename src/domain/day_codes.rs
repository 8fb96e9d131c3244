/// Translation between the app's full day names and the server's
/// three-letter day codes, plus clock-time normalization.
///
/// Unrecognized values pass through unchanged on both directions so an
/// unexpected server value degrades to odd display text instead of a crash.
pub const DAY_ORDER: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub fn day_to_code(day: &str) -> &str {
    match day {
        "monday" => "mon",
        "tuesday" => "tue",
        "wednesday" => "wed",
        "thursday" => "thu",
        "friday" => "fri",
        "saturday" => "sat",
        "sunday" => "sun",
        other => other,
    }
}

pub fn code_to_day(code: &str) -> &str {
    match code {
        "mon" => "monday",
        "tue" => "tuesday",
        "wed" => "wednesday",
        "thu" => "thursday",
        "fri" => "friday",
        "sat" => "saturday",
        "sun" => "sunday",
        other => other,
    }
}

/// Reduces a time string to its first two colon-delimited components,
/// canonically `HH:mm`. Results shorter than 5 characters (single-digit
/// hours, missing minutes) return the input unchanged; downstream screens
/// render these strings verbatim, so short inputs are deliberately not
/// reformatted.
pub fn normalize_time(raw: &str) -> String {
    let mut parts = raw.splitn(3, ':');
    let Some(hours) = parts.next() else {
        return raw.to_string();
    };
    let normalized = match parts.next() {
        Some(minutes) => format!("{hours}:{minutes}"),
        None => hours.to_string(),
    };
    if normalized.len() < 5 {
        raw.to_string()
    } else {
        normalized
    }
}
