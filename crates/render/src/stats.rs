use crate::composite::FrameReport;

/// Weight given to the newest frame in the moving average.
const SMOOTHING: f32 = 0.1;

/// Frame rate derived from successive [`FrameReport::time`] values.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    last_time: Option<f32>,
    avg_dt: Option<f32>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a rendered frame. Frames whose time did not advance are
    /// ignored, since the time uniform is clamped to never decrease.
    pub fn record(&mut self, report: &FrameReport) {
        let now = report.time;
        if let Some(last) = self.last_time {
            let dt = now - last;
            if dt > 0.0 {
                self.avg_dt = Some(match self.avg_dt {
                    Some(avg) => avg + (dt - avg) * SMOOTHING,
                    None => dt,
                });
            }
        }
        self.last_time = Some(now);
    }

    /// Smoothed frames per second, once two distinct frame times are known.
    pub fn fps(&self) -> Option<f32> {
        self.avg_dt.map(|dt| 1.0 / dt)
    }
}
