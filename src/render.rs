use crate::audio::BandEnergies;
use crate::mapping::resolve_live;
use crate::params::ParamKey;
use crate::session::Session;
use crate::surface::{Rgb, Surface};
use anyhow::bail;
use std::time::{Duration, Instant};
use tracing::debug;

const BACKGROUND: Rgb = [0, 0, 0];
const DOT_COLOR: Rgb = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopState {
    Stopped,
    Running { started: Instant, frames: u64 },
}

/// What one tick did. `rendered` is false when the scheduler is stopped or
/// the grid is degenerate (`step <= 0`); in the degenerate case the frame is
/// still cleared to the background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    pub dots: usize,
    pub time: f32,
    pub rendered: bool,
}

impl TickReport {
    fn idle() -> Self {
        Self { frame: 0, dots: 0, time: 0.0, rendered: false }
    }
}

/// Per-frame driver around the pattern functions. One tick is one unit of
/// work; ticks never overlap, and no tick draws after `stop` returns.
pub struct FrameScheduler<S: Surface> {
    surface: S,
    state: LoopState,
}

impl<S: Surface> FrameScheduler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: LoopState::Stopped,
        }
    }

    /// Begins the loop. Idempotent: starting a running scheduler keeps its
    /// clock.
    pub fn start(&mut self, now: Instant) {
        if matches!(self.state, LoopState::Stopped) {
            self.state = LoopState::Running { started: now, frames: 0 };
            debug!("render loop started");
        }
    }

    /// Cancels the loop synchronously. Idempotent; any tick issued after
    /// this returns draws nothing.
    pub fn stop(&mut self) {
        if !matches!(self.state, LoopState::Stopped) {
            self.state = LoopState::Stopped;
            debug!("render loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for external resize notifications; dimensions are
    /// re-measured at the top of the next tick anyway.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Renders one frame: resolve live parameters, clear, apply zoom, walk
    /// the grid, draw dots. Reads session state fresh every call, so edits
    /// and resizes land on the very next tick.
    pub fn tick(&mut self, session: &Session, bands: BandEnergies, now: Instant) -> TickReport {
        let LoopState::Running { started, frames } = self.state else {
            return TickReport::idle();
        };

        let live = resolve_live(session.config(), session.mappings(), bands);
        let speed = live.get(ParamKey::Speed).unwrap_or(1.0);
        let time = now.saturating_duration_since(started).as_secs_f32() * speed;

        // Re-measure every tick; the surface may have been resized since the
        // last frame.
        let w = self.surface.width() as f32;
        let h = self.surface.height() as f32;

        self.surface.clear(BACKGROUND);
        self.surface.set_dot_color(DOT_COLOR);
        self.surface.push_scale(session.zoom());

        let surface = &mut self.surface;
        let dots = live.for_each_dot(time, |dot| {
            let d = dot.to_surface(w, h);
            surface.fill_rect(d.x, d.y, d.size);
        });

        self.surface.pop_transform();

        let frame = frames;
        self.state = LoopState::Running { started, frames: frames + 1 };
        TickReport {
            frame,
            dots: dots.unwrap_or(0),
            time,
            rendered: dots.is_some(),
        }
    }
}

/// Frame-rate gate for the export collaborator: tells the caller when to
/// grab the next frame from the surface. Knows nothing about codecs or
/// containers.
#[derive(Debug, Clone, Copy)]
pub struct CaptureStream {
    interval: Duration,
    next_due: Option<Instant>,
}

impl CaptureStream {
    pub fn new(fps: u32) -> anyhow::Result<Self> {
        if fps == 0 {
            bail!("capture fps must be >= 1");
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            next_due: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a frame is due at `now`; advances the deadline. The first
    /// poll always captures.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            None => {
                self.next_due = Some(now + self.interval);
                true
            }
            Some(due) if now >= due => {
                // Skip forward rather than bursting after a stall.
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            Some(_) => false,
        }
    }
}
