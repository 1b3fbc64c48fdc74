use crate::audio::BandEnergies;
use crate::params::{ParamKey, PatternConfig, PatternFamily};
use std::collections::BTreeMap;
use std::fmt;

/// Which band of the audio snapshot drives a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFeature {
    Bass,
    Mids,
    Treble,
    Overall,
}

pub const AUDIO_FEATURES: [AudioFeature; 4] = [
    AudioFeature::Bass,
    AudioFeature::Mids,
    AudioFeature::Treble,
    AudioFeature::Overall,
];

impl AudioFeature {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bass" => Some(Self::Bass),
            "mids" => Some(Self::Mids),
            "treble" => Some(Self::Treble),
            "overall" => Some(Self::Overall),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bass => "bass",
            Self::Mids => "mids",
            Self::Treble => "treble",
            Self::Overall => "overall",
        }
    }

    pub fn read(self, bands: BandEnergies) -> f32 {
        match self {
            Self::Bass => bands.bass,
            Self::Mids => bands.mids,
            Self::Treble => bands.treble,
            Self::Overall => bands.overall,
        }
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    Additive,
    Multiplicative,
}

impl MappingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "additive" => Some(Self::Additive),
            "multiplicative" => Some(Self::Multiplicative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Multiplicative => "multiplicative",
        }
    }
}

/// One parameter binding: feature, combination mode, and sensitivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioMapping {
    pub feature: AudioFeature,
    pub mode: MappingMode,
    sensitivity: f32,
}

impl AudioMapping {
    /// Sensitivity is clamped to `>= 0` at construction.
    pub fn new(feature: AudioFeature, mode: MappingMode, sensitivity: f32) -> Self {
        Self {
            feature,
            mode,
            sensitivity: clamp_sensitivity(sensitivity),
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Applies this mapping to a base parameter value.
    pub fn apply(&self, base: f32, audio: f32) -> f32 {
        match self.mode {
            MappingMode::Additive => base + audio * self.sensitivity,
            MappingMode::Multiplicative => base * (1.0 + audio * self.sensitivity),
        }
    }
}

fn clamp_sensitivity(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Parameters eligible for the randomized-mapping convenience.
const RANDOMIZABLE: &[ParamKey] = &[
    ParamKey::Distortion,
    ParamKey::Scale,
    ParamKey::Intensity,
    ParamKey::DotSize,
    ParamKey::Speed,
    ParamKey::KoMultiplier,
    ParamKey::EoMultiplier,
    ParamKey::CosMultiplier,
    ParamKey::OBase,
];

/// Sparse table binding parameter names to audio features. At most one entry
/// per parameter; bind replaces, unbind removes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    entries: BTreeMap<ParamKey, AudioMapping>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: ParamKey, mapping: AudioMapping) {
        self.entries.insert(key, mapping);
    }

    pub fn unbind(&mut self, key: ParamKey) {
        self.entries.remove(&key);
    }

    /// Atomically swaps the whole table.
    pub fn replace_all(&mut self, other: MappingTable) {
        self.entries = other.entries;
    }

    /// Retunes an existing entry; no-op when the parameter is unbound.
    pub fn update_sensitivity(&mut self, key: ParamKey, sensitivity: f32) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.sensitivity = clamp_sensitivity(sensitivity);
        }
    }

    /// Switches an existing entry's mode; no-op when the parameter is unbound.
    pub fn update_mode(&mut self, key: ParamKey, mode: MappingMode) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.mode = mode;
        }
    }

    pub fn get(&self, key: ParamKey) -> Option<&AudioMapping> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &AudioMapping)> {
        self.entries.iter().map(|(k, m)| (*k, m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Draws 3..=5 random bindings for the given family. Scale-like
    /// parameters get multiplicative mappings with modest sensitivity;
    /// everything else gets an additive mapping with a wider swing.
    pub fn randomized(family: PatternFamily) -> Self {
        let mut pool: Vec<ParamKey> = RANDOMIZABLE
            .iter()
            .copied()
            .filter(|k| family.keys().contains(k))
            .collect();
        fastrand::shuffle(&mut pool);

        let count = (fastrand::usize(3..=5)).min(pool.len());
        let mut table = Self::new();
        for &key in pool.iter().take(count) {
            let feature = AUDIO_FEATURES[fastrand::usize(0..AUDIO_FEATURES.len())];
            let mode = match key {
                ParamKey::Scale | ParamKey::Speed | ParamKey::DotSize => {
                    MappingMode::Multiplicative
                }
                _ => MappingMode::Additive,
            };
            let sensitivity = match mode {
                MappingMode::Multiplicative => 0.5 + fastrand::f32() * 1.5,
                MappingMode::Additive => 5.0 + fastrand::f32() * 25.0,
            };
            table.bind(key, AudioMapping::new(feature, mode, sensitivity));
        }
        table
    }
}

/// Produces the parameter set actually fed to the pattern function this
/// frame: every bound parameter gets its base value blended with the current
/// audio reading; everything else passes through. The result is discarded
/// after the frame and never written back, so audio can never feed back into
/// the stored base values.
pub fn resolve_live(
    base: &PatternConfig,
    table: &MappingTable,
    bands: BandEnergies,
) -> PatternConfig {
    let mut live = *base;
    for (key, mapping) in table.iter() {
        // Bindings for keys outside the active family pass through silently.
        let Some(value) = live.get(key) else {
            continue;
        };
        let audio = mapping.feature.read(bands).clamp(0.0, 1.0);
        live.set(key, mapping.apply(value, audio));
    }
    live
}
