//! Step- and time-based triggers for the scan and replan loops

/// Fires on the first tick and then every `interval` ticks.
#[derive(Debug, Clone)]
pub struct StepCadence {
    interval: u32,
    counter: u32,
}

impl StepCadence {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            counter: 0,
        }
    }

    pub fn tick(&mut self) -> bool {
        let fire = self.counter == 0;
        self.counter = (self.counter + 1) % self.interval;
        fire
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// Fires once at least `interval` seconds have accumulated, or right
/// away after [`IntervalCadence::trigger`]. Starts triggered.
#[derive(Debug, Clone)]
pub struct IntervalCadence {
    interval: f64,
    elapsed: f64,
    pending: bool,
}

impl IntervalCadence {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            pending: true,
        }
    }

    pub fn tick(&mut self, dt: f64) -> bool {
        self.elapsed += dt.max(0.0);
        if self.pending || self.elapsed >= self.interval {
            // Restart rather than carry over, so a long stall fires once
            self.elapsed = 0.0;
            self.pending = false;
            return true;
        }
        false
    }

    /// Force the next tick to fire.
    pub fn trigger(&mut self) {
        self.pending = true;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.pending = true;
    }
}
