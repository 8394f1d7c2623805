//! Sequential color scales for the hexagon fills and the legend gradient.

use std::fmt;

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    /// Format as CSS: rgb(r,g,b)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// A continuous color ramp defined by evenly-spaced sRGB control points.
pub struct ColorRamp {
    points: &'static [[u8; 3]],
}

impl ColorRamp {
    /// Sample the ramp at `t`, clamped to [0, 1]. NaN samples the low end.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let n = self.points.len();
        if n == 1 {
            let [r, g, b] = self.points[0];
            return Rgb { r, g, b };
        }

        let scaled = t * (n - 1) as f64;
        let lo = (scaled as usize).min(n - 2);
        let frac = scaled - lo as f64;
        let a = self.points[lo];
        let b = self.points[lo + 1];
        let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;

        Rgb { r: mix(0), g: mix(1), b: mix(2) }
    }
}

// Viridis, 16 evenly spaced samples of the matplotlib map.
pub static VIRIDIS: ColorRamp = ColorRamp {
    points: &[
        [0x44, 0x01, 0x54], // dark purple
        [0x48, 0x1a, 0x6c],
        [0x47, 0x2f, 0x7d],
        [0x41, 0x44, 0x87],
        [0x39, 0x56, 0x8c],
        [0x31, 0x68, 0x8e],
        [0x2a, 0x78, 0x8e],
        [0x23, 0x88, 0x8e], // teal
        [0x1f, 0x98, 0x8b],
        [0x22, 0xa8, 0x84],
        [0x35, 0xb7, 0x79],
        [0x54, 0xc5, 0x68],
        [0x7a, 0xd1, 0x51],
        [0xa5, 0xdb, 0x36],
        [0xd2, 0xe2, 0x1b],
        [0xfd, 0xe7, 0x25], // yellow
    ],
};

/// Maps a value in `domain` onto a ramp. Out-of-domain values take the end colors.
#[derive(Clone, Copy)]
pub struct SequentialScale {
    domain: (f64, f64),
    ramp: &'static ColorRamp,
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), ramp: &'static ColorRamp) -> Self {
        Self { domain, ramp }
    }

    pub fn viridis(domain: (f64, f64)) -> Self {
        Self::new(domain, &VIRIDIS)
    }

    pub fn apply(&self, value: f64) -> Rgb {
        let (d0, d1) = self.domain;
        self.ramp.sample((value - d0) / (d1 - d0))
    }
}
