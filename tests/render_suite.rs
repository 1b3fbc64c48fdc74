use dotfield::audio::BandEnergies;
use dotfield::mapping::{AudioFeature, AudioMapping, MappingMode};
use dotfield::params::{ParamKey, PatternConfig, PatternFamily};
use dotfield::render::{CaptureStream, FrameScheduler};
use dotfield::session::Session;
use dotfield::surface::{RasterSurface, Rgb, Surface};
use std::time::{Duration, Instant};

/// Records draw activity instead of rasterizing.
#[derive(Default)]
struct CountingSurface {
    width: usize,
    height: usize,
    clears: usize,
    rects: usize,
    pushes: usize,
    pops: usize,
}

impl CountingSurface {
    fn new(width: usize, height: usize) -> Self {
        Self { width, height, ..Self::default() }
    }
}

impl Surface for CountingSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self, _background: Rgb) {
        self.clears += 1;
    }

    fn set_dot_color(&mut self, _color: Rgb) {}

    fn fill_rect(&mut self, _x: f32, _y: f32, _side: f32) {
        self.rects += 1;
    }

    fn push_scale(&mut self, _factor: f32) {
        self.pushes += 1;
    }

    fn pop_transform(&mut self) {
        self.pops += 1;
    }
}

fn silence() -> BandEnergies {
    BandEnergies::default()
}

#[test]
fn tick_draws_one_rect_per_dot() {
    let session = Session::new(PatternConfig::family_default(PatternFamily::Vortex));
    let mut scheduler = FrameScheduler::new(CountingSurface::new(400, 400));
    let t0 = Instant::now();
    scheduler.start(t0);

    let report = scheduler.tick(&session, silence(), t0);
    assert!(report.rendered);
    assert_eq!(report.frame, 0);
    assert_eq!(report.dots, 101 * 101);
    assert_eq!(scheduler.surface().rects, report.dots);
    assert_eq!(scheduler.surface().clears, 1);
    assert_eq!(scheduler.surface().pushes, scheduler.surface().pops);

    let report = scheduler.tick(&session, silence(), t0);
    assert_eq!(report.frame, 1);
}

#[test]
fn no_draws_after_stop() {
    let session = Session::default();
    let mut scheduler = FrameScheduler::new(CountingSurface::new(200, 200));
    let t0 = Instant::now();
    scheduler.start(t0);
    scheduler.tick(&session, silence(), t0);
    let drawn = scheduler.surface().rects;
    assert!(drawn > 0);

    scheduler.stop();
    assert!(!scheduler.is_running());
    let report = scheduler.tick(&session, silence(), t0 + Duration::from_secs(1));
    assert!(!report.rendered);
    assert_eq!(report.dots, 0);
    assert_eq!(scheduler.surface().rects, drawn);
    assert_eq!(scheduler.surface().clears, 1);
}

#[test]
fn start_and_stop_are_idempotent() {
    let session = Session::default();
    let mut scheduler = FrameScheduler::new(CountingSurface::new(100, 100));
    let t0 = Instant::now();

    scheduler.stop();
    assert!(!scheduler.is_running());

    scheduler.start(t0);
    scheduler.tick(&session, silence(), t0 + Duration::from_secs(2));
    // A second start must not reset the clock or the frame counter.
    scheduler.start(t0 + Duration::from_secs(10));
    let report = scheduler.tick(&session, silence(), t0 + Duration::from_secs(2));
    assert_eq!(report.frame, 1);
    assert!((report.time - 2.0).abs() < 1e-3);

    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
}

#[test]
fn restart_resets_the_clock() {
    let session = Session::default();
    let mut scheduler = FrameScheduler::new(CountingSurface::new(100, 100));
    let t0 = Instant::now();
    scheduler.start(t0);
    scheduler.tick(&session, silence(), t0 + Duration::from_secs(5));
    scheduler.stop();

    let t1 = t0 + Duration::from_secs(60);
    scheduler.start(t1);
    let report = scheduler.tick(&session, silence(), t1);
    assert_eq!(report.frame, 0);
    assert!(report.time.abs() < 1e-3);
}

#[test]
fn degenerate_grid_clears_but_draws_nothing() {
    let mut session = Session::default();
    assert!(session.update_param(ParamKey::Step, 0.0));

    let mut scheduler = FrameScheduler::new(CountingSurface::new(100, 100));
    let t0 = Instant::now();
    scheduler.start(t0);
    let report = scheduler.tick(&session, silence(), t0);
    assert!(!report.rendered);
    assert_eq!(report.dots, 0);
    // The frame is still cleared to the background.
    assert_eq!(scheduler.surface().clears, 1);
    assert_eq!(scheduler.surface().rects, 0);
}

#[test]
fn live_speed_scales_pattern_time() {
    let mut session = Session::default();
    session.mappings_mut().bind(
        ParamKey::Speed,
        AudioMapping::new(AudioFeature::Overall, MappingMode::Multiplicative, 1.0),
    );

    let mut scheduler = FrameScheduler::new(CountingSurface::new(100, 100));
    let t0 = Instant::now();
    scheduler.start(t0);

    let loud = BandEnergies { overall: 0.5, ..BandEnergies::default() };
    let report = scheduler.tick(&session, loud, t0 + Duration::from_secs(1));
    assert!((report.time - 1.5).abs() < 1e-3, "time={}", report.time);

    // Base parameters are untouched by the live resolve.
    assert_eq!(session.config().get(ParamKey::Speed), Some(1.0));

    let report = scheduler.tick(&session, silence(), t0 + Duration::from_secs(1));
    assert!((report.time - 1.0).abs() < 1e-3);
}

#[test]
fn raster_ticks_survive_resizes() {
    let session = Session::default();
    let mut scheduler = FrameScheduler::new(RasterSurface::new(400, 400));
    let t0 = Instant::now();
    scheduler.start(t0);

    let report = scheduler.tick(&session, silence(), t0);
    assert!(report.rendered);
    let lit = |frame: &[u8]| frame.chunks_exact(4).filter(|px| px[0] > 0).count();
    assert!(lit(scheduler.surface().frame_rgba()) > 0);

    scheduler.surface_mut().resize(64, 48);
    let report = scheduler.tick(&session, silence(), t0 + Duration::from_millis(16));
    assert!(report.rendered);
    assert_eq!(scheduler.surface().frame_rgba().len(), 64 * 48 * 4);
    assert!(lit(scheduler.surface().frame_rgba()) > 0);
}

#[test]
fn zoom_changes_the_rasterized_frame() {
    let mut session = Session::default();
    let t0 = Instant::now();

    let mut scheduler = FrameScheduler::new(RasterSurface::new(200, 200));
    scheduler.start(t0);
    scheduler.tick(&session, silence(), t0);
    let plain: Vec<u8> = scheduler.surface().frame_rgba().to_vec();

    session.set_zoom(0.5);
    scheduler.tick(&session, silence(), t0);
    assert_ne!(scheduler.surface().frame_rgba(), plain.as_slice());
}

#[test]
fn capture_stream_rejects_zero_fps() {
    assert!(CaptureStream::new(0).is_err());
    let stream = CaptureStream::new(30).expect("30 fps is valid");
    assert_eq!(stream.interval(), Duration::from_secs_f64(1.0 / 30.0));
}

#[test]
fn capture_stream_paces_frames() {
    let mut stream = CaptureStream::new(10).expect("valid fps");
    let t0 = Instant::now();

    assert!(stream.poll(t0));
    assert!(!stream.poll(t0));
    assert!(!stream.poll(t0 + Duration::from_millis(50)));
    assert!(stream.poll(t0 + Duration::from_millis(100)));

    // After a long stall it resumes at the stall point instead of bursting.
    assert!(stream.poll(t0 + Duration::from_secs(5)));
    assert!(!stream.poll(t0 + Duration::from_secs(5) + Duration::from_millis(50)));
    assert!(stream.poll(t0 + Duration::from_secs(5) + Duration::from_millis(100)));
}
