use std::path::Path;
use std::time::Instant;

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames advance on a clock or are
/// evaluated at a single fixed timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderPolicy {
    /// Advance the frame loop continuously.
    Animate {
        /// Frame rate used for fixed stepping and pacing.
        fps: f32,
        /// When true, time comes from the system clock instead of fixed steps.
        realtime: bool,
    },
    /// Render a single frame at the given timestamp (seconds).
    Still { time: f32 },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate {
            fps: 60.0,
            realtime: false,
        }
    }
}

/// File formats supported by the export path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => Ok(ExportFormat::Png),
            None => Err("export path has no extension; expected .png".to_string()),
            Some(other) => Err(format!(
                "unsupported export format '.{other}'; expected .png"
            )),
        }
    }
}

/// Snapshot of the time state fed to phase updaters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    /// Creates a new time sample.
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
}

impl FixedTimeSource {
    /// Constructs a fixed time source that always returns the provided time.
    pub fn new(time: f32) -> Self {
        Self { time }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn sample(&mut self) -> TimeSample {
        TimeSample::new(self.time, 0)
    }
}

/// Deterministic clock reporting `frame / fps` seconds.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    fps: f32,
    frame: u64,
}

impl FixedStepTimeSource {
    /// Non-positive or non-finite rates fall back to 60 FPS.
    pub fn new(fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self { fps, frame: 0 }
    }

    /// Effective step rate after the fallback.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl TimeSource for FixedStepTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        // computed from the frame index so steps never accumulate rounding
        let sample = TimeSample::new((self.frame as f64 / self.fps as f64) as f32, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match *policy {
        RenderPolicy::Animate {
            realtime: true, ..
        } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Animate { fps, .. } => Box::new(FixedStepTimeSource::new(fps)),
        RenderPolicy::Still { time } => Box::new(FixedTimeSource::new(time)),
    }
}

/// One tick of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub seconds: f32,
    pub delta: f32,
    pub frame_index: u64,
}

/// Converts successive time samples into per-frame deltas.
///
/// The first tick measures from time zero; a sample that goes backwards
/// yields a zero delta instead of a negative one.
pub struct FrameClock {
    source: BoxedTimeSource,
    last: Option<TimeSample>,
}

impl FrameClock {
    pub fn new(source: BoxedTimeSource) -> Self {
        Self { source, last: None }
    }

    pub fn for_policy(policy: &RenderPolicy) -> Self {
        Self::new(time_source_for_policy(policy))
    }

    pub fn reset(&mut self) {
        self.source.reset();
        self.last = None;
    }

    pub fn tick(&mut self) -> FrameTick {
        let sample = self.source.sample();
        let previous = self.last.replace(sample);
        let delta = match previous {
            Some(prev) => (sample.seconds - prev.seconds).max(0.0),
            None => sample.seconds.max(0.0),
        };
        FrameTick {
            seconds: sample.seconds,
            delta,
            frame_index: sample.frame_index,
        }
    }
}
