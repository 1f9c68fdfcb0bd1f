//! Console report printed for every run.

use chrono::{DateTime, Local, TimeZone};

use crate::http_probe::prelude::*;

const RULE_WIDTH: usize = 50;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_fixed_width(input: &str, width: usize) -> String {
    use unicode_truncate::{Alignment, UnicodeTruncateStr};

    // Pads by display width, so CJK names line up with ASCII ones.
    input.unicode_pad(width, Alignment::Left, true).into_owned()
}

/// Number of terminal columns `input` occupies.
pub fn display_width(input: &str) -> usize {
    use unicode_truncate::UnicodeTruncateStr;

    input.unicode_truncate(usize::MAX).1
}

pub fn banner<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\nProbe time: {}\n{rule}", now.format(TIME_FORMAT))
}

pub fn footer() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Multi-line block describing one result. `name` is padded to `width` so
/// consecutive blocks line up.
pub fn format_result(result: &ProbeResult, name: &str, width: usize) -> String {
    let icon = if result.is_healthy() { "✅" } else { "❌" };
    let status_code = result
        .status_code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let response_time = result
        .response_time_seconds()
        .map(|s| format!("{:.2}s", s))
        .unwrap_or_else(|| "N/A".to_string());

    let mut block = format!(
        "[{}] {icon} {}\n   Status: {}\n   Status code: {status_code}\n   Response time: {response_time}\n   Checked at: {}",
        to_fixed_width(name, width),
        result.url(),
        result.status(),
        result.timestamp().with_timezone(&Local).format(TIME_FORMAT),
    );
    if let Some(detail) = result.error_detail() {
        block.push_str("\n   Error: ");
        block.push_str(detail);
    }
    block
}

pub fn summary(results: &[ProbeResult]) -> String {
    let healthy = results.iter().filter(|r| r.is_healthy()).count();
    format!("{healthy}/{} targets healthy", results.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_to_fixed_width_pads_and_truncates() {
        assert_eq!(to_fixed_width("psych", 8), "psych   ");
        assert_eq!(to_fixed_width("sherry1499.github.io", 7), "sherry1");
        // Wide characters count by display width.
        assert_eq!(to_fixed_width("心理测试", 4), "心理");
    }

    #[test]
    fn test_display_width_counts_columns() {
        assert_eq!(display_width("psych-test"), 10);
        assert_eq!(display_width("心理测试"), 8);
    }

    #[test]
    fn test_banner() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).single().expect("valid date");
        let expected = format!(
            "{rule}\nProbe time: 2026-10-19 08:30:00\n{rule}",
            rule = "=".repeat(50)
        );
        assert_eq!(banner(&now), expected);
    }

    #[test]
    fn test_format_healthy_result() {
        let result = ProbeResult::healthy("https://site.example/", 200, Duration::from_millis(1234));
        let block = format_result(&result, "site", 6);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "[site  ] ✅ https://site.example/");
        assert_eq!(lines[1], "   Status: Healthy");
        assert_eq!(lines[2], "   Status code: 200");
        assert_eq!(lines[3], "   Response time: 1.23s");
        assert!(lines[4].starts_with("   Checked at: "));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_format_failed_result() {
        let result = ProbeResult::timeout("https://slow.example/", Duration::from_secs(5));
        let block = format_result(&result, "slow", 4);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "[slow] ❌ https://slow.example/");
        assert_eq!(lines[1], "   Status: Timeout");
        assert_eq!(lines[2], "   Status code: N/A");
        assert_eq!(lines[3], "   Response time: N/A");
        assert_eq!(lines[5], "   Error: request exceeded 5s");
    }

    #[test]
    fn test_summary() {
        let results = vec![
            ProbeResult::healthy("https://a.example/", 200, Duration::ZERO),
            ProbeResult::http_error("https://b.example/", 404, Duration::ZERO),
        ];
        assert_eq!(summary(&results), "1/2 targets healthy");
    }
}
