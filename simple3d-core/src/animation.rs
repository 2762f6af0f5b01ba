/// Frame loop bookkeeping: update callbacks, render requests and tweens
use std::time::Duration;

type Update<C> = Box<dyn FnMut(&mut C, Duration)>;

/// Per-frame driver owned by the host.
///
/// The host calls [`FrameLoop::tick`] once per frame. Updates run in
/// registration order. Renders are requested on demand and coalesced: any
/// number of requests between two ticks produce one render.
pub struct FrameLoop<C> {
    updates: Vec<Update<C>>,
    render_requested: bool,
    elapsed: Duration,
    frame: u64,
    stats: FrameStats,
}

impl<C> Default for FrameLoop<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FrameLoop<C> {
    pub fn new() -> Self {
        Self {
            updates: Vec::new(),
            // The first frame always renders
            render_requested: true,
            elapsed: Duration::ZERO,
            frame: 0,
            stats: FrameStats::default(),
        }
    }

    /// Add an update run every frame with the time since the previous frame
    pub fn on_update<F>(&mut self, update: F)
    where
        F: FnMut(&mut C, Duration) + 'static,
    {
        self.updates.push(Box::new(update));
    }

    /// Ask for a render on the next tick. Returns false if one was already pending.
    pub fn request_render(&mut self) -> bool {
        if self.render_requested {
            return false;
        }
        self.render_requested = true;
        true
    }

    pub fn render_requested(&self) -> bool {
        self.render_requested
    }

    /// Advance one frame. Returns true when the host should render it,
    /// which is always the case while updates are registered.
    pub fn tick(&mut self, context: &mut C, dt: Duration) -> bool {
        self.frame += 1;
        self.elapsed += dt;
        self.stats.record(dt);
        for update in &mut self.updates {
            update(context, dt);
        }
        let render = self.render_requested || !self.updates.is_empty();
        self.render_requested = false;
        render
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Total time fed through `tick`
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

/// Rolling frames-per-second estimate, refreshed once per second of frames
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    window: Duration,
    frames_in_window: u32,
    fps: f32,
}

impl FrameStats {
    pub fn record(&mut self, dt: Duration) {
        self.window += dt;
        self.frames_in_window += 1;
        if self.window >= Duration::from_secs(1) {
            self.fps = self.frames_in_window as f32 / self.window.as_secs_f32();
            self.window = Duration::ZERO;
            self.frames_in_window = 0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Quadratic ease in and out
    QuadInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// How many times a [`Tween`] plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Extra plays after the first; `Times(0)` plays once
    Times(u32),
    Forever,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Times(0)
    }
}

/// Scalar interpolation over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub easing: Easing,
    pub repeat: Repeat,
    /// Play every other cycle backwards
    pub yoyo: bool,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::Linear,
            repeat: Repeat::default(),
            yoyo: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Value at `elapsed`; holds the last cycle's end value once finished
    pub fn sample(&self, elapsed: Duration) -> f32 {
        let (cycle, progress) = self.cycle_at(elapsed);
        let progress = if self.yoyo && cycle % 2 == 1 {
            1.0 - progress
        } else {
            progress
        };
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }

    /// Never true for [`Repeat::Forever`]
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        match self.repeat {
            Repeat::Times(extra) => elapsed >= self.duration.saturating_mul(extra.saturating_add(1)),
            Repeat::Forever => false,
        }
    }

    /// Index of the cycle playing at `elapsed` and the progress through it
    fn cycle_at(&self, elapsed: Duration) -> (u64, f32) {
        let last = match self.repeat {
            Repeat::Times(extra) => Some(u64::from(extra)),
            Repeat::Forever => None,
        };
        if self.duration.is_zero() {
            return (last.unwrap_or(0), 1.0);
        }
        let position = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        match last {
            Some(last) if position >= (last + 1) as f64 => (last, 1.0),
            _ => (position.floor() as u64, position.fract() as f32),
        }
    }
}
