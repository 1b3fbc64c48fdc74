use crate::mapping::MappingTable;
use crate::params::{ParamKey, ParamSetError, PatternConfig, PatternFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ZOOM_MIN: f32 = 0.1;
pub const ZOOM_MAX: f32 = 5.0;

/// One editing session: the authoritative base parameters, the audio mapping
/// table, and the view zoom. The render loop only ever reads from here;
/// writes go through the explicit operations below.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    config: PatternConfig,
    mappings: MappingTable,
    zoom: f32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PatternConfig::default())
    }
}

impl Session {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            mappings: MappingTable::new(),
            zoom: 1.0,
        }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    pub fn mappings_mut(&mut self) -> &mut MappingTable {
        &mut self.mappings
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Switches families: parameters reset to the family defaults, zoom to
    /// 1.0, and all mappings are cleared.
    pub fn set_family(&mut self, family: PatternFamily) {
        self.config = PatternConfig::family_default(family);
        self.mappings.clear();
        self.zoom = 1.0;
    }

    /// Edits one base parameter. Returns false when the key is not part of
    /// the active family's vocabulary.
    pub fn update_param(&mut self, key: ParamKey, value: f32) -> bool {
        self.config.set(key, value)
    }

    /// Restores the active family's defaults and drops all mappings. Zoom is
    /// left alone.
    pub fn reset_pattern(&mut self) {
        self.config = PatternConfig::family_default(self.config.family());
        self.mappings.clear();
    }

    /// Adopts a validated config. Mappings are cleared; zoom resets to 1.0
    /// unless the load supplies one.
    pub fn load_config(&mut self, config: PatternConfig, zoom: Option<f32>) {
        self.config = config;
        self.mappings.clear();
        self.zoom = clamp_zoom(zoom.unwrap_or(1.0));
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Multiplicative zoom step (wheel input lands here).
    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    /// Pan input translates to offset edits on the base parameters.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if let Some(x) = self.config.get(ParamKey::XOffset) {
            self.config.set(ParamKey::XOffset, x + dx);
        }
        if let Some(y) = self.config.get(ParamKey::YOffset) {
            self.config.set(ParamKey::YOffset, y + dy);
        }
    }

    /// Snapshot of the session in the config-file wire shape.
    pub fn export_config(&self) -> ConfigFile {
        ConfigFile {
            pattern: self.config.family().as_str().to_string(),
            params: self.config.to_map(),
            timestamp: iso8601_utc(SystemTime::now()),
        }
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(ZOOM_MIN, ZOOM_MAX)
    } else {
        1.0
    }
}

/// Wire shape of a saved pattern config. Produced and consumed by the UI
/// layer; the engine's obligation is validation before adoption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub pattern: String,
    pub params: BTreeMap<String, f32>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigFileError {
    Io(String),
    Json(String),
    UnknownPattern(String),
    Params(ParamSetError),
}

impl fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Json(msg) => write!(f, "invalid config JSON: {msg}"),
            Self::UnknownPattern(name) => write!(f, "unknown pattern '{name}'"),
            Self::Params(err) => write!(f, "invalid params: {err}"),
        }
    }
}

impl std::error::Error for ConfigFileError {}

impl From<ParamSetError> for ConfigFileError {
    fn from(err: ParamSetError) -> Self {
        Self::Params(err)
    }
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        serde_json::from_str(text).map_err(|e| ConfigFileError::Json(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigFileError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    pub fn to_json(&self) -> String {
        // BTreeMap keys and struct fields give a stable layout.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigFileError> {
        std::fs::write(path.as_ref(), self.to_json())
            .map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Validates the family tag and the full key set. Nothing is applied on
    /// failure; the caller's current config stays untouched.
    pub fn to_pattern_config(&self) -> Result<PatternConfig, ConfigFileError> {
        let family = PatternFamily::parse(&self.pattern)
            .ok_or_else(|| ConfigFileError::UnknownPattern(self.pattern.clone()))?;
        Ok(PatternConfig::from_map(family, &self.params)?)
    }
}

/// ISO-8601 UTC timestamp (`YYYY-MM-DDTHH:MM:SSZ`) without a date crate:
/// civil-from-days conversion over the unix epoch.
pub fn iso8601_utc(t: SystemTime) -> String {
    let secs = t
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (hh, mm, ss) = (rem / 3600, (rem % 3600) / 60, rem % 60);

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };

    format!("{year:04}-{month:02}-{day:02}T{hh:02}:{mm:02}:{ss:02}Z")
}
