use foundation::time::Time;

/// Largest frame delta fed to animation; longer gaps (background tabs,
/// debugger pauses) are treated as one slow frame.
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// Frame metadata handed to every per-frame step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Clamped delta time (seconds).
    pub dt_s: f64,
    /// Elapsed time since the clock started (seconds).
    pub time: Time,
}

/// Turns host timestamps (e.g. `requestAnimationFrame` milliseconds) into
/// `Frame`s with a clamped delta.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
    elapsed_s: f64,
    index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, timestamp_ms: f64) -> Frame {
        let dt_s = match self.last_ms {
            Some(last) if timestamp_ms.is_finite() => {
                ((timestamp_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT_S)
            }
            _ => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_ms = Some(timestamp_ms);
        }
        self.elapsed_s += dt_s;
        let frame = Frame {
            index: self.index,
            dt_s,
            time: Time(self.elapsed_s),
        };
        self.index += 1;
        frame
    }

    pub fn frames(&self) -> u64 {
        self.index
    }
}
