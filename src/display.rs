//! Presentation helpers for analyses.
//!
//! Pure functions: nothing here reads the store or the clock directly.

use crate::models::{Analysis, Timestamp};
use chrono::{Local, TimeZone};

const MINUTE_MS: i64 = 60 * 1000;

/// Render `timestamp` relative to `now`.
///
/// Under a minute is "Just now", under an hour "N min ago", under a day
/// "N hour(s) ago"; anything older is an absolute local date such as
/// "Jan 5, 2025, 3:04 PM".
pub fn format_timestamp(timestamp: Timestamp, now: Timestamp) -> String {
    let diff = now.saturating_sub(timestamp);
    let minutes = diff.div_euclid(MINUTE_MS);
    let hours = minutes.div_euclid(60);

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" })
    } else {
        format_absolute(timestamp)
    }
}

/// en-US style absolute date in local time.
pub fn format_absolute(timestamp: Timestamp) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(date) => date.format("%b %-d, %Y, %-I:%M %p").to_string(),
        None => timestamp.to_string(),
    }
}

/// One-line summary used by `list`.
pub fn analysis_line(analysis: &Analysis, now: Timestamp, is_current: bool) -> String {
    let info = analysis.status.info();
    let marker = if is_current { "▶" } else { " " };
    let progress = match analysis.progress {
        Some(p) if p > 0 && p < 100 => format!(" {:>3}%", p),
        _ => String::new(),
    };

    format!(
        "{} {:<12} {:<40} {}{}  [{}]",
        marker,
        info.text,
        analysis.title,
        format_timestamp(analysis.timestamp, now),
        progress,
        analysis.id
    )
}

/// Multi-line detail block used by `show`.
pub fn analysis_details(analysis: &Analysis, now: Timestamp) -> String {
    let mut out = String::new();
    let info = analysis.status.info();

    out.push_str(&format!("{}\n", analysis.title));
    out.push_str(&format!("  id:         {}\n", analysis.id));
    out.push_str(&format!("  status:     {} ({})\n", info.text, analysis.status));
    out.push_str(&format!(
        "  created:    {}\n",
        format_timestamp(analysis.timestamp, now)
    ));
    if let Some(indication) = &analysis.indication {
        let label = analysis.indication_display_name.as_deref().unwrap_or(indication);
        out.push_str(&format!("  indication: {}\n", label));
    }
    if let Some(analysis_type) = &analysis.analysis_type {
        let label = analysis.analysis_display_name.as_deref().unwrap_or(analysis_type);
        out.push_str(&format!("  type:       {} ({})\n", label, analysis_type));
    }
    if let Some(progress) = analysis.progress {
        out.push_str(&format!("  progress:   {}%\n", progress));
    }
    if let Some(updated) = analysis.last_updated {
        out.push_str(&format!("  updated:    {}\n", format_timestamp(updated, now)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisStatus;

    const NOW: Timestamp = 1_700_000_000_000;
    const HOUR: i64 = 3_600_000;

    #[test]
    fn test_relative_buckets() {
        assert_eq!(format_timestamp(NOW - 30_000, NOW), "Just now");
        assert_eq!(format_timestamp(NOW, NOW), "Just now");
        assert_eq!(format_timestamp(NOW - 60_000, NOW), "1 min ago");
        assert_eq!(format_timestamp(NOW - 5 * 60_000, NOW), "5 min ago");
        assert_eq!(format_timestamp(NOW - 59 * 60_000 - 59_000, NOW), "59 min ago");
        assert_eq!(format_timestamp(NOW - HOUR, NOW), "1 hour ago");
        assert_eq!(format_timestamp(NOW - 3 * HOUR, NOW), "3 hours ago");
        assert_eq!(format_timestamp(NOW - 23 * HOUR, NOW), "23 hours ago");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        assert_eq!(format_timestamp(NOW + 90_000, NOW), "Just now");
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        assert_eq!(format_timestamp(i64::MAX, NOW), "Just now");
        assert_eq!(format_timestamp(NOW, i64::MIN), "Just now");
        assert_eq!(format_timestamp(i64::MIN, NOW), format_absolute(i64::MIN));
        assert_eq!(format_timestamp(i64::MIN, i64::MAX), format_absolute(i64::MIN));
    }

    #[test]
    fn test_absolute_after_a_day() {
        let ts = NOW - 48 * HOUR;
        let rendered = format_timestamp(ts, NOW);
        assert_eq!(rendered, format_absolute(ts));
        assert!(rendered.contains("2023"));
        assert!(rendered.ends_with("AM") || rendered.ends_with("PM"));
    }

    #[test]
    fn test_analysis_line_marks_current() {
        let mut analysis = Analysis::new("AML", "AML", "persistency", "Persistency", NOW);
        analysis.status = AnalysisStatus::Running;
        analysis.progress = Some(42);

        let line = analysis_line(&analysis, NOW, true);
        assert!(line.starts_with('▶'));
        assert!(line.contains("Running"));
        assert!(line.contains("42%"));
        assert!(line.contains(&analysis.id));
    }

    #[test]
    fn test_analysis_details() {
        let analysis = Analysis::new("Breast Cancer", "Breast Cancer", "market-access", "Payer Mix", NOW);
        let details = analysis_details(&analysis, NOW + 5 * 60_000);
        assert!(details.contains("Breast Cancer - Payer Mix"));
        assert!(details.contains("Payer Mix (market-access)"));
        assert!(details.contains("5 min ago"));
        assert!(details.contains("progress:   0%"));
    }
}
