use crate::params::{PatternConfig, SpiralParams, VortexParams};

/// Side of the logical square the generators emit into. Screen mapping is a
/// plain proportional scale from this space to surface pixels.
pub const LOGICAL_SIZE: f32 = 400.0;

/// One dot in logical 400x400 space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotPoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl DotPoint {
    /// Maps the logical position into actual surface pixels. The dot side is
    /// a pixel size and is left alone.
    pub fn to_surface(self, surface_w: f32, surface_h: f32) -> DotPoint {
        DotPoint {
            x: self.x * surface_w / LOGICAL_SIZE,
            y: self.y * surface_h / LOGICAL_SIZE,
            size: self.size,
        }
    }
}

/// Vortex closed form. Pure: identical inputs yield bit-identical outputs.
pub fn vortex_point(x: f32, y: f32, time: f32, p: &VortexParams) -> DotPoint {
    let k = (x / p.x_divisor - p.x_subtractor) * p.scale;
    let e = (y / p.y_divisor - p.y_subtractor) * p.scale;
    let mag = (k * k + e * e).sqrt();
    let o = p.o_base - mag / p.o_divisor;

    let d = -p.distortion
        * ((k / p.sin_divisor).sin() * (e * p.cos_multiplier).cos()).abs()
        * p.intensity;

    let px = (x - d * k * p.x_k_multiplier + d * k * (d + time).sin()) * p.x_scale
        + k * o * p.ko_multiplier
        + p.x_offset;
    let py = (y - (d * y) / p.y_div_factor + d * e * (d + time + o).cos() * (time + d).sin())
        * p.y_scale
        + e * o * p.eo_multiplier
        + p.y_offset;

    DotPoint { x: px, y: py, size: p.dot_size }
}

/// Spiral closed form. Returns `None` for cells where `|k| < 0.001`: the
/// `tan(1/k)` term has a singularity there and the cell is skipped outright
/// rather than clamped.
pub fn spiral_point(x: f32, y: f32, time: f32, p: &SpiralParams) -> Option<DotPoint> {
    let k = x / p.x_divisor - p.x_subtractor;
    let e = y / p.y_divisor + p.y_subtractor;

    if k.abs() < 0.001 {
        return None;
    }

    let mag = (k * k + e * e).sqrt();
    let o = mag / p.o_divisor;
    let c = (o * e) / p.y_div_factor - time / 8.0;

    let q = x
        + 99.0
        + (1.0 / k).tan()
        + o * k
            * ((e * p.cos_multiplier).cos() / 2.0 + (y / p.y_divisor).cos() / 0.7)
            * (o * p.ko_multiplier - time * 2.0).sin();

    let px = q * p.x_scale * c.sin() + p.x_offset;
    let py = p.y_offset + y * (c * p.eo_multiplier - o).cos() - (q / 2.0) * c.cos();

    Some(DotPoint { x: px, y: py, size: p.dot_size })
}

/// Grid bounds for one frame of a pattern: `0..=x_max` by `0..=y_max`,
/// stepped by `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub x_max: f32,
    pub y_max: f32,
    pub step: f32,
}

impl Grid {
    /// Nothing upstream guarantees `step > 0`; a zero or negative step would
    /// iterate forever, so it renders nothing instead.
    pub fn is_renderable(&self) -> bool {
        self.step > 0.0
            && self.step.is_finite()
            && self.x_max.is_finite()
            && self.y_max.is_finite()
    }
}

impl PatternConfig {
    pub fn grid(&self) -> Grid {
        match self {
            Self::Vortex(p) => Grid { x_max: p.x_max, y_max: p.y_max, step: p.step },
            Self::Spiral(p) => Grid { x_max: p.x_max, y_max: p.y_max, step: p.step },
        }
    }

    /// Evaluates the active family's generator for one grid cell.
    pub fn point(&self, x: f32, y: f32, time: f32) -> Option<DotPoint> {
        match self {
            Self::Vortex(p) => Some(vortex_point(x, y, time, p)),
            Self::Spiral(p) => spiral_point(x, y, time, p),
        }
    }

    /// Walks the grid in row-major order, invoking `emit` for every cell the
    /// generator produces a dot for. Returns the number of dots emitted, or
    /// `None` when the grid is degenerate (`step <= 0` etc.).
    pub fn for_each_dot<F: FnMut(DotPoint)>(&self, time: f32, mut emit: F) -> Option<usize> {
        let grid = self.grid();
        if !grid.is_renderable() {
            return None;
        }

        let mut dots = 0usize;
        let mut y = 0.0f32;
        while y <= grid.y_max {
            let mut x = 0.0f32;
            while x <= grid.x_max {
                if let Some(dot) = self.point(x, y, time) {
                    emit(dot);
                    dots += 1;
                }
                x += grid.step;
            }
            y += grid.step;
        }
        Some(dots)
    }
}
