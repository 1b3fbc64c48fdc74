pub mod audio;
pub mod config;
pub mod mapping;
pub mod params;
pub mod pattern;
pub mod render;
pub mod session;
pub mod surface;
