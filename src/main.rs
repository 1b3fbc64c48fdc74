use anyhow::{Context, Result, bail};
use clap::Parser;
use std::time::{Duration, Instant};
use tracing::warn;

use dotfield::audio::AudioExtractor;
use dotfield::config::{Config, PatternArg, SourceArg};
use dotfield::mapping::MappingTable;
use dotfield::params::{PatternConfig, PatternFamily};
use dotfield::render::FrameScheduler;
use dotfield::session::{ConfigFile, Session};
use dotfield::surface::RasterSurface;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cfg = Config::parse();
    if cfg.list_devices {
        return dotfield::audio::list_input_devices();
    }
    run(cfg)
}

fn run(cfg: Config) -> Result<()> {
    if cfg.width == 0 || cfg.height == 0 {
        bail!("--width and --height must be >= 1");
    }
    if cfg.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if cfg.duration <= 0.0 {
        bail!("--duration must be > 0 seconds");
    }

    let pattern = match &cfg.config {
        Some(path) => {
            let file = ConfigFile::load(path)
                .with_context(|| format!("load pattern config {}", path.display()))?;
            file.to_pattern_config().context("validate pattern config")?
        }
        None => PatternConfig::family_default(match cfg.pattern {
            PatternArg::Vortex => PatternFamily::Vortex,
            PatternArg::Spiral => PatternFamily::Spiral,
        }),
    };

    let mut session = Session::new(pattern);
    session.set_zoom(cfg.zoom);
    if cfg.random_mappings {
        let family = session.config().family();
        session
            .mappings_mut()
            .replace_all(MappingTable::randomized(family));
    }

    // A failed audio source is not fatal: the loop renders with zeros.
    let mut extractor = AudioExtractor::new();
    match cfg.source {
        SourceArg::None => {}
        SourceArg::Mic => {
            if let Err(err) = extractor.start_mic(cfg.device.as_deref()) {
                warn!(%err, "microphone unavailable; rendering without audio");
            }
        }
        SourceArg::File => {
            let path = cfg.file.as_ref().context("--source file requires --file")?;
            if let Err(err) = extractor.start_file(path) {
                warn!(%err, "audio file unavailable; rendering without audio");
            }
        }
    }
    let bands = extractor.shared();

    let mut scheduler = FrameScheduler::new(RasterSurface::new(cfg.width, cfg.height));
    let start = Instant::now();
    scheduler.start(start);

    let frame_dur = Duration::from_secs_f64(1.0 / cfg.fps as f64);
    let total_frames = ((cfg.duration * cfg.fps as f32).floor() as u64).max(1);
    let mut dots_total = 0u64;
    let mut next_frame = start;

    for _ in 0..total_frames {
        let now = Instant::now();
        if now < next_frame {
            std::thread::sleep(next_frame - now);
        }
        let report = scheduler.tick(&session, bands.load(), Instant::now());
        dots_total += report.dots as u64;
        next_frame += frame_dur;
    }

    scheduler.stop();
    extractor.stop();

    let elapsed = start.elapsed().as_secs_f32();
    println!(
        "{}: {} frames in {:.2}s ({:.1} fps), {} dots ({:.0}/frame)",
        session.config().family(),
        total_frames,
        elapsed,
        total_frames as f32 / elapsed.max(1e-6),
        dots_total,
        dots_total as f32 / total_frames as f32
    );
    Ok(())
}
