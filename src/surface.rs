pub type Rgb = [u8; 3];

/// The raster the engine draws into. Deliberately tiny: current dimensions
/// (which may change between frames), clear-and-fill, filled squares, and a
/// uniform-scale transform stack. Nothing else is used.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn clear(&mut self, background: Rgb);
    fn set_dot_color(&mut self, color: Rgb);
    /// Draws a filled square with top-left corner `(x, y)` and side `side`,
    /// in the current transform.
    fn fill_rect(&mut self, x: f32, y: f32, side: f32);
    /// Pushes a uniform scale centered on the origin.
    fn push_scale(&mut self, factor: f32);
    fn pop_transform(&mut self);
}

/// In-memory RGBA implementation. Doubles as the capturable frame source for
/// the export collaborator.
pub struct RasterSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    dot_color: Rgb,
    scales: Vec<f32>,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
            dot_color: [255, 255, 255],
            scales: Vec::new(),
        }
    }

    /// Resizes the backing store, modeling an asynchronous surface resize.
    /// Contents are reset to transparent black.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0u8; width * height * 4];
    }

    /// Current frame as tightly packed RGBA.
    pub fn frame_rgba(&self) -> &[u8] {
        &self.pixels
    }

    fn scale(&self) -> f32 {
        self.scales.iter().product()
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn clear(&mut self, background: Rgb) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = background[0];
            px[1] = background[1];
            px[2] = background[2];
            px[3] = 255;
        }
    }

    fn set_dot_color(&mut self, color: Rgb) {
        self.dot_color = color;
    }

    fn fill_rect(&mut self, x: f32, y: f32, side: f32) {
        let s = self.scale();
        let (x, y, side) = (x * s, y * s, side * s);
        if !x.is_finite() || !y.is_finite() || !(side > 0.0) {
            return;
        }

        let x0 = x.floor().max(0.0) as i64;
        let y0 = y.floor().max(0.0) as i64;
        let x1 = ((x + side).ceil() as i64).min(self.width as i64);
        let y1 = ((y + side).ceil() as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let [r, g, b] = self.dot_color;
        for py in y0..y1 {
            let row = (py as usize) * self.width;
            for px in x0..x1 {
                let i = (row + px as usize) * 4;
                self.pixels[i] = r;
                self.pixels[i + 1] = g;
                self.pixels[i + 2] = b;
                self.pixels[i + 3] = 255;
            }
        }
    }

    fn push_scale(&mut self, factor: f32) {
        self.scales.push(factor);
    }

    fn pop_transform(&mut self) {
        self.scales.pop();
    }
}
