use std::collections::BTreeMap;
use std::fmt;

/// The two supported pattern generators. Each family has its own coefficient
/// vocabulary; the pairing with a parameter struct is enforced by
/// [`PatternConfig`], never by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFamily {
    Vortex,
    Spiral,
}

impl PatternFamily {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vortex" => Some(Self::Vortex),
            "spiral" => Some(Self::Spiral),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vortex => "vortex",
            Self::Spiral => "spiral",
        }
    }

    /// The fixed key set for this family, in wire order.
    pub fn keys(self) -> &'static [ParamKey] {
        match self {
            Self::Vortex => VORTEX_KEYS,
            Self::Spiral => SPIRAL_KEYS,
        }
    }
}

impl fmt::Display for PatternFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union vocabulary across both families. Wire names are camelCase to match
/// the pattern-config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Speed,
    Scale,
    Intensity,
    Distortion,
    XOffset,
    YOffset,
    DotSize,
    XMax,
    YMax,
    Step,
    XDivisor,
    XSubtractor,
    YDivisor,
    YSubtractor,
    OBase,
    ODivisor,
    SinDivisor,
    CosMultiplier,
    XKMultiplier,
    XScale,
    KoMultiplier,
    YDivFactor,
    YScale,
    EoMultiplier,
}

const VORTEX_KEYS: &[ParamKey] = &[
    ParamKey::Speed,
    ParamKey::Scale,
    ParamKey::Intensity,
    ParamKey::Distortion,
    ParamKey::XOffset,
    ParamKey::YOffset,
    ParamKey::DotSize,
    ParamKey::XMax,
    ParamKey::YMax,
    ParamKey::Step,
    ParamKey::XDivisor,
    ParamKey::XSubtractor,
    ParamKey::YDivisor,
    ParamKey::YSubtractor,
    ParamKey::OBase,
    ParamKey::ODivisor,
    ParamKey::SinDivisor,
    ParamKey::CosMultiplier,
    ParamKey::XKMultiplier,
    ParamKey::XScale,
    ParamKey::KoMultiplier,
    ParamKey::YDivFactor,
    ParamKey::YScale,
    ParamKey::EoMultiplier,
];

const SPIRAL_KEYS: &[ParamKey] = &[
    ParamKey::Speed,
    ParamKey::Scale,
    ParamKey::Intensity,
    ParamKey::Distortion,
    ParamKey::XOffset,
    ParamKey::YOffset,
    ParamKey::DotSize,
    ParamKey::XMax,
    ParamKey::YMax,
    ParamKey::Step,
    ParamKey::XDivisor,
    ParamKey::XSubtractor,
    ParamKey::YDivisor,
    ParamKey::YSubtractor,
    ParamKey::ODivisor,
    ParamKey::CosMultiplier,
    ParamKey::XScale,
    ParamKey::KoMultiplier,
    ParamKey::YDivFactor,
    ParamKey::EoMultiplier,
];

impl ParamKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "speed" => Some(Self::Speed),
            "scale" => Some(Self::Scale),
            "intensity" => Some(Self::Intensity),
            "distortion" => Some(Self::Distortion),
            "xOffset" => Some(Self::XOffset),
            "yOffset" => Some(Self::YOffset),
            "dotSize" => Some(Self::DotSize),
            "xMax" => Some(Self::XMax),
            "yMax" => Some(Self::YMax),
            "step" => Some(Self::Step),
            "xDivisor" => Some(Self::XDivisor),
            "xSubtractor" => Some(Self::XSubtractor),
            "yDivisor" => Some(Self::YDivisor),
            "ySubtractor" => Some(Self::YSubtractor),
            "oBase" => Some(Self::OBase),
            "oDivisor" => Some(Self::ODivisor),
            "sinDivisor" => Some(Self::SinDivisor),
            "cosMultiplier" => Some(Self::CosMultiplier),
            "xKMultiplier" => Some(Self::XKMultiplier),
            "xScale" => Some(Self::XScale),
            "koMultiplier" => Some(Self::KoMultiplier),
            "yDivFactor" => Some(Self::YDivFactor),
            "yScale" => Some(Self::YScale),
            "eoMultiplier" => Some(Self::EoMultiplier),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Scale => "scale",
            Self::Intensity => "intensity",
            Self::Distortion => "distortion",
            Self::XOffset => "xOffset",
            Self::YOffset => "yOffset",
            Self::DotSize => "dotSize",
            Self::XMax => "xMax",
            Self::YMax => "yMax",
            Self::Step => "step",
            Self::XDivisor => "xDivisor",
            Self::XSubtractor => "xSubtractor",
            Self::YDivisor => "yDivisor",
            Self::YSubtractor => "ySubtractor",
            Self::OBase => "oBase",
            Self::ODivisor => "oDivisor",
            Self::SinDivisor => "sinDivisor",
            Self::CosMultiplier => "cosMultiplier",
            Self::XKMultiplier => "xKMultiplier",
            Self::XScale => "xScale",
            Self::KoMultiplier => "koMultiplier",
            Self::YDivFactor => "yDivFactor",
            Self::YScale => "yScale",
            Self::EoMultiplier => "eoMultiplier",
        }
    }

    /// Slider range for UI clamping. Advisory only: the engine tolerates
    /// out-of-range values (degenerate visuals are acceptable, crashes are
    /// not).
    pub fn range(self, family: PatternFamily) -> (f32, f32) {
        use PatternFamily::*;
        match (self, family) {
            (Self::Speed, _) => (0.0, 3.0),
            (Self::Scale, _) => (0.1, 3.0),
            (Self::Intensity, _) => (0.0, 3.0),
            (Self::Distortion, _) => (0.0, 20.0),
            (Self::DotSize, _) => (0.1, 2.0),
            (Self::XOffset, _) | (Self::YOffset, _) => (0.0, 400.0),
            (Self::XMax, _) | (Self::YMax, _) => (10.0, 800.0),
            (Self::Step, _) => (0.5, 3.0),
            (Self::XDivisor, Vortex) => (1.0, 20.0),
            (Self::XDivisor, Spiral) => (0.0, 20.0),
            (Self::XSubtractor, _) => (0.0, 20.0),
            (Self::YDivisor, Vortex) => (1.0, 20.0),
            (Self::YDivisor, Spiral) => (0.0, 30.0),
            (Self::YSubtractor, _) => (0.0, 20.0),
            (Self::OBase, _) => (0.0, 5.0),
            (Self::ODivisor, Vortex) => (1.0, 10.0),
            (Self::ODivisor, Spiral) => (1.0, 20.0),
            (Self::SinDivisor, _) => (0.1, 10.0),
            (Self::CosMultiplier, Vortex) => (0.1, 5.0),
            (Self::CosMultiplier, Spiral) => (0.1, 20.0),
            (Self::XKMultiplier, _) => (0.0, 10.0),
            (Self::XScale, Vortex) => (0.1, 2.0),
            (Self::XScale, Spiral) => (0.1, 5.0),
            (Self::KoMultiplier, Vortex) => (0.0, 5.0),
            (Self::KoMultiplier, Spiral) => (0.1, 10.0),
            (Self::YDivFactor, Vortex) => (0.0, 10.0),
            (Self::YDivFactor, Spiral) => (1.0, 50.0),
            (Self::YScale, _) => (0.1, 2.0),
            (Self::EoMultiplier, Vortex) => (0.0, 5.0),
            (Self::EoMultiplier, Spiral) => (0.1, 10.0),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vortex coefficient set. Defaults are the product's signature look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VortexParams {
    pub speed: f32,
    pub scale: f32,
    pub intensity: f32,
    pub distortion: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub dot_size: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub step: f32,
    pub x_divisor: f32,
    pub x_subtractor: f32,
    pub y_divisor: f32,
    pub y_subtractor: f32,
    pub o_base: f32,
    pub o_divisor: f32,
    pub sin_divisor: f32,
    pub cos_multiplier: f32,
    pub x_k_multiplier: f32,
    pub x_scale: f32,
    pub ko_multiplier: f32,
    pub y_div_factor: f32,
    pub y_scale: f32,
    pub eo_multiplier: f32,
}

impl Default for VortexParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            scale: 1.0,
            intensity: 1.0,
            distortion: 5.0,
            x_offset: 130.0,
            y_offset: 70.0,
            dot_size: 1.0,
            x_max: 200.0,
            y_max: 200.0,
            step: 2.0,
            x_divisor: 10.0,
            x_subtractor: 10.0,
            y_divisor: 8.0,
            y_subtractor: 12.0,
            o_base: 2.0,
            o_divisor: 3.0,
            sin_divisor: 2.0,
            cos_multiplier: 0.8,
            x_k_multiplier: 4.0,
            x_scale: 0.7,
            ko_multiplier: 2.0,
            y_div_factor: 5.0,
            y_scale: 0.7,
            eo_multiplier: 1.0,
        }
    }
}

impl VortexParams {
    pub fn get(&self, key: ParamKey) -> Option<f32> {
        Some(match key {
            ParamKey::Speed => self.speed,
            ParamKey::Scale => self.scale,
            ParamKey::Intensity => self.intensity,
            ParamKey::Distortion => self.distortion,
            ParamKey::XOffset => self.x_offset,
            ParamKey::YOffset => self.y_offset,
            ParamKey::DotSize => self.dot_size,
            ParamKey::XMax => self.x_max,
            ParamKey::YMax => self.y_max,
            ParamKey::Step => self.step,
            ParamKey::XDivisor => self.x_divisor,
            ParamKey::XSubtractor => self.x_subtractor,
            ParamKey::YDivisor => self.y_divisor,
            ParamKey::YSubtractor => self.y_subtractor,
            ParamKey::OBase => self.o_base,
            ParamKey::ODivisor => self.o_divisor,
            ParamKey::SinDivisor => self.sin_divisor,
            ParamKey::CosMultiplier => self.cos_multiplier,
            ParamKey::XKMultiplier => self.x_k_multiplier,
            ParamKey::XScale => self.x_scale,
            ParamKey::KoMultiplier => self.ko_multiplier,
            ParamKey::YDivFactor => self.y_div_factor,
            ParamKey::YScale => self.y_scale,
            ParamKey::EoMultiplier => self.eo_multiplier,
        })
    }

    pub fn set(&mut self, key: ParamKey, value: f32) -> bool {
        let slot = match key {
            ParamKey::Speed => &mut self.speed,
            ParamKey::Scale => &mut self.scale,
            ParamKey::Intensity => &mut self.intensity,
            ParamKey::Distortion => &mut self.distortion,
            ParamKey::XOffset => &mut self.x_offset,
            ParamKey::YOffset => &mut self.y_offset,
            ParamKey::DotSize => &mut self.dot_size,
            ParamKey::XMax => &mut self.x_max,
            ParamKey::YMax => &mut self.y_max,
            ParamKey::Step => &mut self.step,
            ParamKey::XDivisor => &mut self.x_divisor,
            ParamKey::XSubtractor => &mut self.x_subtractor,
            ParamKey::YDivisor => &mut self.y_divisor,
            ParamKey::YSubtractor => &mut self.y_subtractor,
            ParamKey::OBase => &mut self.o_base,
            ParamKey::ODivisor => &mut self.o_divisor,
            ParamKey::SinDivisor => &mut self.sin_divisor,
            ParamKey::CosMultiplier => &mut self.cos_multiplier,
            ParamKey::XKMultiplier => &mut self.x_k_multiplier,
            ParamKey::XScale => &mut self.x_scale,
            ParamKey::KoMultiplier => &mut self.ko_multiplier,
            ParamKey::YDivFactor => &mut self.y_div_factor,
            ParamKey::YScale => &mut self.y_scale,
            ParamKey::EoMultiplier => &mut self.eo_multiplier,
        };
        *slot = value;
        true
    }
}

/// Spiral coefficient set. Narrower than vortex: no `oBase`, `sinDivisor`,
/// `xKMultiplier`, or `yScale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralParams {
    pub speed: f32,
    pub scale: f32,
    pub intensity: f32,
    pub distortion: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub dot_size: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub step: f32,
    pub x_divisor: f32,
    pub x_subtractor: f32,
    pub y_divisor: f32,
    pub y_subtractor: f32,
    pub o_divisor: f32,
    pub cos_multiplier: f32,
    pub x_scale: f32,
    pub ko_multiplier: f32,
    pub y_div_factor: f32,
    pub eo_multiplier: f32,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            scale: 1.0,
            intensity: 1.0,
            distortion: 5.0,
            x_offset: 200.0,
            y_offset: 200.0,
            dot_size: 1.0,
            x_max: 90.0,
            y_max: 90.0,
            step: 1.0,
            x_divisor: 4.0,
            x_subtractor: 12.0,
            y_divisor: 9.0,
            y_subtractor: 9.0,
            o_divisor: 9.0,
            cos_multiplier: 9.0,
            x_scale: 0.7,
            ko_multiplier: 4.0,
            y_div_factor: 30.0,
            eo_multiplier: 4.0,
        }
    }
}

impl SpiralParams {
    pub fn get(&self, key: ParamKey) -> Option<f32> {
        Some(match key {
            ParamKey::Speed => self.speed,
            ParamKey::Scale => self.scale,
            ParamKey::Intensity => self.intensity,
            ParamKey::Distortion => self.distortion,
            ParamKey::XOffset => self.x_offset,
            ParamKey::YOffset => self.y_offset,
            ParamKey::DotSize => self.dot_size,
            ParamKey::XMax => self.x_max,
            ParamKey::YMax => self.y_max,
            ParamKey::Step => self.step,
            ParamKey::XDivisor => self.x_divisor,
            ParamKey::XSubtractor => self.x_subtractor,
            ParamKey::YDivisor => self.y_divisor,
            ParamKey::YSubtractor => self.y_subtractor,
            ParamKey::ODivisor => self.o_divisor,
            ParamKey::CosMultiplier => self.cos_multiplier,
            ParamKey::XScale => self.x_scale,
            ParamKey::KoMultiplier => self.ko_multiplier,
            ParamKey::YDivFactor => self.y_div_factor,
            ParamKey::EoMultiplier => self.eo_multiplier,
            ParamKey::OBase
            | ParamKey::SinDivisor
            | ParamKey::XKMultiplier
            | ParamKey::YScale => return None,
        })
    }

    pub fn set(&mut self, key: ParamKey, value: f32) -> bool {
        let slot = match key {
            ParamKey::Speed => &mut self.speed,
            ParamKey::Scale => &mut self.scale,
            ParamKey::Intensity => &mut self.intensity,
            ParamKey::Distortion => &mut self.distortion,
            ParamKey::XOffset => &mut self.x_offset,
            ParamKey::YOffset => &mut self.y_offset,
            ParamKey::DotSize => &mut self.dot_size,
            ParamKey::XMax => &mut self.x_max,
            ParamKey::YMax => &mut self.y_max,
            ParamKey::Step => &mut self.step,
            ParamKey::XDivisor => &mut self.x_divisor,
            ParamKey::XSubtractor => &mut self.x_subtractor,
            ParamKey::YDivisor => &mut self.y_divisor,
            ParamKey::YSubtractor => &mut self.y_subtractor,
            ParamKey::ODivisor => &mut self.o_divisor,
            ParamKey::CosMultiplier => &mut self.cos_multiplier,
            ParamKey::XScale => &mut self.x_scale,
            ParamKey::KoMultiplier => &mut self.ko_multiplier,
            ParamKey::YDivFactor => &mut self.y_div_factor,
            ParamKey::EoMultiplier => &mut self.eo_multiplier,
            ParamKey::OBase
            | ParamKey::SinDivisor
            | ParamKey::XKMultiplier
            | ParamKey::YScale => return false,
        };
        *slot = value;
        true
    }
}

/// Family tag and parameter set as one tagged union. A vortex coefficient can
/// never be paired with a spiral render path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternConfig {
    Vortex(VortexParams),
    Spiral(SpiralParams),
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self::Spiral(SpiralParams::default())
    }
}

impl PatternConfig {
    pub fn family_default(family: PatternFamily) -> Self {
        match family {
            PatternFamily::Vortex => Self::Vortex(VortexParams::default()),
            PatternFamily::Spiral => Self::Spiral(SpiralParams::default()),
        }
    }

    pub fn family(&self) -> PatternFamily {
        match self {
            Self::Vortex(_) => PatternFamily::Vortex,
            Self::Spiral(_) => PatternFamily::Spiral,
        }
    }

    pub fn get(&self, key: ParamKey) -> Option<f32> {
        match self {
            Self::Vortex(p) => p.get(key),
            Self::Spiral(p) => p.get(key),
        }
    }

    /// Returns false when the key is not part of this family's vocabulary.
    pub fn set(&mut self, key: ParamKey, value: f32) -> bool {
        match self {
            Self::Vortex(p) => p.set(key, value),
            Self::Spiral(p) => p.set(key, value),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, f32> {
        let mut out = BTreeMap::new();
        for &key in self.family().keys() {
            if let Some(v) = self.get(key) {
                out.insert(key.as_str().to_string(), v);
            }
        }
        out
    }

    /// Builds a config from a wire map. The key set must match the family's
    /// vocabulary exactly; nothing is applied on failure.
    pub fn from_map(
        family: PatternFamily,
        map: &BTreeMap<String, f32>,
    ) -> Result<Self, ParamSetError> {
        let mut config = Self::family_default(family);
        for (name, &value) in map {
            let key = ParamKey::parse(name)
                .ok_or_else(|| ParamSetError::UnknownKey(name.clone()))?;
            if !config.set(key, value) {
                return Err(ParamSetError::ForeignKey { family, key });
            }
        }
        for &key in family.keys() {
            if !map.contains_key(key.as_str()) {
                return Err(ParamSetError::MissingKey { family, key });
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSetError {
    UnknownKey(String),
    ForeignKey { family: PatternFamily, key: ParamKey },
    MissingKey { family: PatternFamily, key: ParamKey },
}

impl fmt::Display for ParamSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey(name) => write!(f, "unknown parameter '{name}'"),
            Self::ForeignKey { family, key } => {
                write!(f, "parameter '{key}' does not belong to the {family} family")
            }
            Self::MissingKey { family, key } => {
                write!(f, "missing {family} parameter '{key}'")
            }
        }
    }
}

impl std::error::Error for ParamSetError {}
