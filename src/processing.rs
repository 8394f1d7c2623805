use crate::color::SequentialScale;
use crate::config::CanvasConfig;
use crate::hexbin::Hexbin;
use crate::scale::{extent, LinearScale};
use crate::types::{HexCell, SamplePoint};
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use tracing::{debug, info};

/// Data-space → pixel-space mappings shared by the points and the boundaries.
#[derive(Debug, Clone, Copy)]
pub struct PixelScales {
    pub x: LinearScale,
    pub y: LinearScale,
}

impl PixelScales {
    /// Fit the sample extent inside the canvas margins. The y axis is flipped so
    /// larger data values are drawn higher up.
    pub fn fit(points: &[SamplePoint], canvas: &CanvasConfig) -> Result<Self> {
        let x_extent = extent(points.iter().map(|p| p.x))
            .ok_or_else(|| anyhow!("No x coordinates to compute an extent from"))?;
        let y_extent = extent(points.iter().map(|p| p.y))
            .ok_or_else(|| anyhow!("No y coordinates to compute an extent from"))?;
        debug!("Sample extent x={:?} y={:?}", x_extent, y_extent);

        Ok(Self {
            x: LinearScale::new(x_extent, (canvas.margin, canvas.width - canvas.margin)),
            y: LinearScale::new(y_extent, (canvas.height - canvas.margin, canvas.margin)),
        })
    }

    #[inline]
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.apply(x), self.y.apply(y))
    }
}

/// Fill in `px`/`py` for every sample.
pub fn project_points(points: &mut [SamplePoint], scales: &PixelScales) {
    points.par_iter_mut().for_each(|point| {
        let (px, py) = scales.project(point.x, point.y);
        point.px = px;
        point.py = py;
    });
}

/// Bin the projected samples and color each non-empty cell by its mean `average`.
pub fn summarize_cells(points: &[SamplePoint], hexbin: &Hexbin, color: &SequentialScale) -> Vec<HexCell> {
    let bins = hexbin.bin(points.iter().map(|p| (p.px, p.py)));

    let cells: Vec<HexCell> = bins
        .par_iter()
        .filter_map(|bin| {
            let mean = mean(bin.members.iter().map(|&i| points[i].average))?;
            Some(HexCell {
                x: bin.x,
                y: bin.y,
                count: bin.members.len(),
                mean,
                fill: color.apply(mean).to_string(),
            })
        })
        .collect();

    info!("Binned {} points into {} hexagons", points.len(), cells.len());
    cells
}

/// Arithmetic mean, ignoring NaN. `None` when nothing is left.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
