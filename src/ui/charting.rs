use crate::time_series::TimeSeriesPoint;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(samples: &[TimeSeriesPoint], fallback_secs: f64) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|p| p.wpm).max().unwrap_or(0);

    let mut overall_duration = match samples.last() {
        Some(p) => p.second as f64,
        None => fallback_secs,
    };
    if overall_duration < 1.0 {
        overall_duration = 1.0;
    }

    (overall_duration, f64::from(highest_wpm.max(1)))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
