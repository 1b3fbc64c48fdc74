use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dotfield",
    version,
    about = "Audio-reactive procedural dot-pattern engine (headless runner)"
)]
pub struct Config {
    /// Pattern family to render when no config file is given.
    #[arg(long, value_enum, default_value_t = PatternArg::Spiral)]
    pub pattern: PatternArg,

    /// Pattern-config JSON file to load instead of family defaults.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SourceArg::None)]
    pub source: SourceArg,

    /// WAV file for --source file.
    #[arg(long, value_name = "WAV")]
    pub file: Option<PathBuf>,

    /// Input device substring match for --source mic.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, default_value_t = 640)]
    pub width: usize,

    #[arg(long, default_value_t = 640)]
    pub height: usize,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// How long to run, in seconds.
    #[arg(long, default_value_t = 5.0)]
    pub duration: f32,

    #[arg(long, default_value_t = 1.0)]
    pub zoom: f32,

    /// Start with a randomized audio mapping table.
    #[arg(long, default_value_t = false)]
    pub random_mappings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    Vortex,
    Spiral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Render with zero-valued audio features.
    None,
    Mic,
    File,
}
