//! Human-facing number formatting.

/// `1234567` -> `1,234,567`.
pub fn group_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rounded to the nearest integer and grouped; non-finite values render as `-`.
pub fn format_grouped(v: f64) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    group_thousands(v.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::{format_grouped, group_thousands};

    #[test]
    fn grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
    }

    #[test]
    fn grouped_floats_round() {
        assert_eq!(format_grouped(12_345.6), "12,346");
        assert_eq!(format_grouped(f64::NAN), "-");
    }
}
