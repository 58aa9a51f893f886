//! Pausable clock for animation time.
//!
//! The clock can read its own time source or be driven by explicit
//! timestamps (the `*_at` methods), which is how the frame loop feeds it
//! `requestAnimationFrame` times. While paused, time stands still; resuming
//! continues from the paused value instead of jumping ahead.

#[cfg(feature = "web")]
use web_sys::window;

#[cfg(not(feature = "web"))]
use std::time::Instant;

/// A clock for measuring elapsed time and delta time, in seconds.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Whether the clock is running.
    running: bool,
    /// Whether time is frozen.
    paused: bool,
    /// Timestamp of the last update.
    old_time: f64,
    /// Total elapsed time while running and not paused.
    elapsed_time: f64,

    #[cfg(not(feature = "web"))]
    instant: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Create a new clock (not started).
    pub fn new() -> Self {
        Self {
            running: false,
            paused: false,
            old_time: 0.0,
            elapsed_time: 0.0,
            #[cfg(not(feature = "web"))]
            instant: Instant::now(),
        }
    }

    /// Current time of the clock's own source, in seconds.
    pub fn now(&self) -> f64 {
        #[cfg(feature = "web")]
        {
            window()
                .and_then(|w| w.performance())
                .map(|p| p.now() / 1000.0)
                .unwrap_or(0.0)
        }

        #[cfg(not(feature = "web"))]
        {
            self.instant.elapsed().as_secs_f64()
        }
    }

    /// Start the clock.
    pub fn start(&mut self) {
        self.start_at(self.now());
    }

    /// Start the clock at timestamp `now`.
    pub fn start_at(&mut self, now: f64) {
        self.old_time = now;
        self.elapsed_time = 0.0;
        self.running = true;
        self.paused = false;
    }

    /// Get the elapsed time since the clock started.
    pub fn get_elapsed_time(&mut self) -> f64 {
        self.get_elapsed_time_at(self.now())
    }

    /// Advance to `now` and return the elapsed time.
    pub fn get_elapsed_time_at(&mut self, now: f64) -> f64 {
        self.get_delta_at(now);
        self.elapsed_time
    }

    /// Get the time since the last update.
    pub fn get_delta(&mut self) -> f64 {
        self.get_delta_at(self.now())
    }

    /// Advance to `now` and return the time since the last update.
    ///
    /// Starts the clock on first use. Returns zero while paused and never
    /// runs backwards.
    pub fn get_delta_at(&mut self, now: f64) -> f64 {
        if !self.running {
            self.start_at(now);
            return 0.0;
        }
        if self.paused {
            return 0.0;
        }

        let diff = (now - self.old_time).max(0.0);
        self.old_time = now;
        self.elapsed_time += diff;
        diff
    }

    /// Freeze time at `now`.
    pub fn pause_at(&mut self, now: f64) {
        if self.running && !self.paused {
            self.get_delta_at(now);
            self.paused = true;
        }
    }

    /// Continue from the frozen value; time between pause and resume is dropped.
    pub fn resume_at(&mut self, now: f64) {
        if self.paused {
            self.old_time = now;
            self.paused = false;
        }
    }

    /// Elapsed time as of the last update.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed_time
    }

    /// Check if the clock is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether time is frozen.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
