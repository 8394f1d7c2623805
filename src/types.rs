use geo::Geometry;

/// One municipal community sample from the points table.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub geo_code: String,
    pub average: f64,
    pub x: f64,
    pub y: f64,
    // Pixel position, filled in once by processing::project_points
    pub px: f64,
    pub py: f64,
}

impl SamplePoint {
    pub fn new(geo_code: impl Into<String>, average: f64, x: f64, y: f64) -> Self {
        Self { geo_code: geo_code.into(), average, x, y, px: f64::NAN, py: f64::NAN }
    }
}

/// A municipal boundary outline. Never joined to the sample points.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub geometry: Geometry<f64>,
}

/// A non-empty hexagonal cell, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    /// Cell centre in pixel space.
    pub x: f64,
    pub y: f64,
    pub count: usize,
    pub mean: f64,
    pub fill: String,
}

impl HexCell {
    /// Mean to two places, halves rounded away from zero.
    pub fn tooltip(&self) -> String {
        format!("Mean value: {:.2}", (self.mean * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(mean: f64) -> HexCell {
        HexCell { x: 0.0, y: 0.0, count: 2, mean, fill: "rgb(0,0,0)".to_string() }
    }

    #[test]
    fn tooltip_rounds_halves_up() {
        assert_eq!(cell((0.10 + 0.15) / 2.0).tooltip(), "Mean value: 0.13");
        assert_eq!(cell(0.375).tooltip(), "Mean value: 0.38");
        assert_eq!(cell(0.2).tooltip(), "Mean value: 0.20");
    }
}
