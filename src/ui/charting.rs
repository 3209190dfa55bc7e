use keyball_tutor::stats::UserStatistics;

/// Sessions plotted on the statistics chart
pub const CHART_SESSIONS: usize = 15;

/// (session number, wpm) for the most recent sessions, oldest first
pub fn wpm_points(stats: &UserStatistics, limit: usize) -> Vec<(f64, f64)> {
    let history = &stats.session_history;
    let skip = history.len().saturating_sub(limit);
    history
        .iter()
        .skip(skip)
        .enumerate()
        .map(|(i, entry)| ((i + 1) as f64, entry.wpm as f64))
        .collect()
}

/// Compute X (session) and Y (WPM) bounds for the progress chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let mut sessions = points.last().map_or(1.0, |p| p.0);
    if sessions < 2.0 {
        sessions = 2.0;
    }

    // headroom so the top point is not drawn on the border
    let ceiling = ((highest_wpm * 1.1) / 10.0).ceil() * 10.0;
    (sessions, ceiling.max(10.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keyball_tutor::metrics::SessionResult;
    use keyball_tutor::stats::SessionKind;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 10.0);
    }

    #[test]
    fn test_compute_chart_params() {
        let (x, y) = compute_chart_params(&[(1.0, 20.0), (2.0, 47.0), (3.0, 30.0)]);
        assert_eq!(x, 3.0);
        assert_eq!(y, 60.0);
    }

    #[test]
    fn test_wpm_points_keeps_latest() {
        let mut stats = UserStatistics::default();
        for wpm in 1..=20 {
            stats.finalize_session(
                &SessionResult {
                    wpm,
                    accuracy: 100,
                    duration_seconds: 1,
                },
                "quotes",
                SessionKind::Typing,
                Utc::now(),
            );
        }
        let points = wpm_points(&stats, CHART_SESSIONS);
        assert_eq!(points.len(), 15);
        assert_eq!(points[0], (1.0, 6.0));
        assert_eq!(points[14], (15.0, 20.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
