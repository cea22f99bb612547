use crate::types::Sample;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// CPU figures stay in cores, two decimals.
pub fn round_cores(cores: f64) -> f64 {
    round_to(cores, 2)
}

/// Whole MiB from the two-decimal figure, ties to even.
pub fn round_mebibytes(mib: f64) -> i64 {
    round_to(mib, 2).round_ties_even() as i64
}

/// Decimal form that always keeps a fractional part: `1.0`, `0.25`, `12.5`.
pub fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0.0"
        return "0.0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        return format!("{:.1}", value);
    }
    format!("{}", value)
}

/// cAdvisor series label the container `container_name` on older clusters.
pub fn container_label(sample: &Sample) -> Option<&str> {
    let non_empty = |name: &&str| !name.is_empty();
    sample
        .label("container")
        .filter(non_empty)
        .or_else(|| sample.label("container_name").filter(non_empty))
}

pub fn parse_sample_value(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// PromQL range selector duration, e.g. `2d`, `90m`, `500ms`.
pub fn is_valid_time_range(range: &str) -> bool {
    let unit_start = range
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(range.len());
    let (digits, unit) = range.split_at(unit_start);
    !digits.is_empty() && matches!(unit, "ms" | "s" | "m" | "h" | "d" | "w" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_ties_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.135, 2), 0.14);
        assert_eq!(round_to(3.4950001, 2), 3.5);
    }

    #[test]
    fn test_round_cores() {
        assert_eq!(round_cores(0.25), 0.25);
        assert_eq!(round_cores(1.0), 1.0);
        assert_eq!(round_cores(0.0123456), 0.01);
        assert_eq!(round_cores(0.000001), 0.0);
    }

    #[test]
    fn test_round_mebibytes() {
        assert_eq!(round_mebibytes(511.4), 511);
        assert_eq!(round_mebibytes(511.5), 512);
        assert_eq!(round_mebibytes(0.49), 0);
        assert_eq!(round_mebibytes(0.5), 0);
        assert_eq!(round_mebibytes(2.5), 2);
        assert_eq!(round_mebibytes(4.5), 4);
        // two-decimal rounding happens first: 3.4950001 -> 3.5 -> 4
        assert_eq!(round_mebibytes(3.4950001), 4);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1.0), "1.0");
        assert_eq!(format_decimal(250.0), "250.0");
        assert_eq!(format_decimal(0.25), "0.25");
        assert_eq!(format_decimal(0.01), "0.01");
        assert_eq!(format_decimal(12.5), "12.5");
        assert_eq!(format_decimal(-0.0), "0.0");
    }

    #[test]
    fn test_container_label() {
        let s = Sample::new([("container", "app"), ("container_name", "legacy")], "1");
        assert_eq!(container_label(&s), Some("app"));

        let s = Sample::new([("container_name", "legacy")], "1");
        assert_eq!(container_label(&s), Some("legacy"));

        let s = Sample::new([("pod", "web-1")], "1");
        assert_eq!(container_label(&s), None);

        let s = Sample::new([("container", "")], "1");
        assert_eq!(container_label(&s), None);

        let s = Sample::new([("container", ""), ("container_name", "legacy")], "1");
        assert_eq!(container_label(&s), Some("legacy"));
    }

    #[test]
    fn test_parse_sample_value() {
        assert_eq!(parse_sample_value("0.5"), Some(0.5));
        assert_eq!(parse_sample_value(" 128 "), Some(128.0));
        assert_eq!(parse_sample_value("1e3"), Some(1000.0));
        assert_eq!(parse_sample_value("NaN"), None);
        assert_eq!(parse_sample_value("+Inf"), None);
        assert_eq!(parse_sample_value("abc"), None);
    }

    #[test]
    fn test_time_range_validation() {
        for ok in ["2d", "90m", "500ms", "1w", "12h", "30s", "1y"] {
            assert!(is_valid_time_range(ok), "expected valid: {}", ok);
        }
        for bad in ["", "d", "2", "2x", "-1d", "1.5h", "2 d"] {
            assert!(!is_valid_time_range(bad), "expected invalid: {}", bad);
        }
    }
}
