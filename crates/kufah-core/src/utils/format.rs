/// Format a phone number for display
/// Normalizes ten-digit numbers (optionally prefixed with 1) to (XXX) XXX-XXXX
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let local = match digits.len() {
        10 => &digits[..],
        11 if digits.starts_with('1') => &digits[1..],
        _ => return phone.trim().to_string(),
    };
    format!("({}) {}-{}", &local[0..3], &local[3..6], &local[6..10])
}

/// Truncate a string to at most `max_len` characters, adding an ellipsis if cut
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Format a date string as "Mar 09, 2025"
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Some(day) = date
        .get(..10)
        .and_then(|prefix| chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        day.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("15551234567"), "(555) 123-4567");
        assert_eq!(format_phone("555-123-4567"), "(555) 123-4567");
        assert_eq!(format_phone("+1 (555) 123-4567"), "(555) 123-4567");
        assert_eq!(format_phone(" 123 "), "123");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Abdur-Rahman", 3), "Abd");
        assert_eq!(truncate_string("ʿAbdullāh", 9), "ʿAbdullāh");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("a@b.co"), "-"), "a@b.co");
        assert_eq!(format_optional(Some("  "), "-"), "-");
        assert_eq!(format_optional(None, "(none)"), "(none)");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-03-09"), "Mar 09, 2025");
        assert_eq!(format_date("2025-03-09T10:00:00Z"), "Mar 09, 2025");
        assert_eq!(format_date("sometime"), "sometime");
    }
}
