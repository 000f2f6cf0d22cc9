/// Scores above 10 are treated as 0-100 scale and folded back to 0-10.
/// Scores at or below 10 are returned untouched, so the fold is idempotent.
pub fn normalize_score(score: f64) -> f64 {
    if score > 10.0 {
        (score / 10.0).round()
    } else {
        score
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// A 0-10 score shown on the 100-point scale, e.g. `8.0` → `80分`.
pub fn format_score(score: f64) -> String {
    format!("{}分", (score * 10.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_score() {
        assert_eq!(normalize_score(10.0), 10.0);
        assert_eq!(normalize_score(11.0), 1.0);
        assert_eq!(normalize_score(15.0), 2.0);
        assert_eq!(normalize_score(85.0), 9.0);
        assert_eq!(normalize_score(100.0), 10.0);
        assert_eq!(normalize_score(7.5), 7.5);
        assert_eq!(normalize_score(0.0), 0.0);
        assert_eq!(normalize_score(normalize_score(85.0)), 9.0);
    }

    #[test]
    fn test_round_and_format() {
        assert_eq!(round_to_tenth(3.14159), 3.1);
        assert_eq!(round_to_tenth(2.25), 2.3);
        assert_eq!(lerp(50.0, 60.0, 0.5), 55.0);
        assert_eq!(format_score(8.0), "80分");
        assert_eq!(format_score(7.25), "73分");
        assert_eq!(format_score(0.0), "0分");
    }
}
