/// One WPM observation taken at a whole elapsed second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeriesPoint {
    pub second: u64,
    pub wpm: u32,
}

impl TimeSeriesPoint {
    pub fn new(second: u64, wpm: u32) -> Self {
        Self { second, wpm }
    }
}

/// Chart coordinates, seconds on x and WPM on y
impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.second as f64, f64::from(p.wpm))
    }
}
