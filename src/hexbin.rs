//! Hexagonal binning over a pixel plane.
//!
//! Cells are pointy-topped hexagons laid out in offset rows: row `j` sits at
//! `y = j * dy` and odd rows are shifted right by half a cell width. Every
//! point with finite coordinates lands in exactly one cell. Near a row
//! boundary the choice between two candidate cells is made in grid units
//! (x / dx, y / dy), so a point close to a slanted edge can go to the cell
//! whose centre is marginally farther in pixels.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::svg::fmt_num;

/// A non-empty cell and the indices of the points it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    /// Cell centre.
    pub x: f64,
    pub y: f64,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Hexbin {
    radius: f64,
    dx: f64,
    dy: f64,
    extent: [[f64; 2]; 2],
}

impl Hexbin {
    pub fn new(radius: f64, extent: [[f64; 2]; 2]) -> Self {
        Self {
            radius,
            dx: radius * 2.0 * (PI / 3.0).sin(),
            dy: radius * 1.5,
            extent,
        }
    }

    /// Grid cell (column, row) containing the pixel position.
    pub fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        let py = y / self.dy;
        let mut pj = py.round();
        let px = x / self.dx - odd(pj as i64) / 2.0;
        let mut pi = px.round();
        let py1 = py - pj;

        // Near a row boundary the diagonal neighbour in the next row may be closer.
        // Distances are compared in grid units, not pixels.
        if py1.abs() * 3.0 > 1.0 {
            let step_x = if px < pi { -0.5 } else { 0.5 };
            let step_y = if py < pj { -1.0 } else { 1.0 };
            let pi2 = pi + step_x;
            let pj2 = pj + step_y;
            let own = (px - pi).powi(2) + py1.powi(2);
            let other = (px - pi2).powi(2) + (py - pj2).powi(2);
            if own > other {
                let shift = if odd(pj as i64) == 1.0 { 0.5 } else { -0.5 };
                pi = pi2 + shift;
                pj = pj2;
            }
        }

        (pi as i64, pj as i64)
    }

    /// Pixel centre of grid cell (i, j).
    pub fn center(&self, i: i64, j: i64) -> (f64, f64) {
        ((i as f64 + odd(j) / 2.0) * self.dx, j as f64 * self.dy)
    }

    /// Group positions into cells. Positions with a NaN coordinate are skipped;
    /// cells come back in the order their first member was seen.
    pub fn bin<I>(&self, positions: I) -> Vec<Bin>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bins: Vec<Bin> = Vec::new();
        let mut by_cell: HashMap<(i64, i64), usize> = HashMap::new();

        for (index, (x, y)) in positions.into_iter().enumerate() {
            if x.is_nan() || y.is_nan() {
                continue;
            }
            let (i, j) = self.cell_of(x, y);
            match by_cell.get(&(i, j)) {
                Some(&slot) => bins[slot].members.push(index),
                None => {
                    let (cx, cy) = self.center(i, j);
                    by_cell.insert((i, j), bins.len());
                    bins.push(Bin { x: cx, y: cy, members: vec![index] });
                }
            }
        }

        bins
    }

    /// Centres of every cell needed to cover the extent.
    pub fn centers(&self) -> Vec<(f64, f64)> {
        let [[x0, y0], [x1, y1]] = self.extent;
        let mut centers = Vec::new();

        let mut y = y0;
        let mut odd_row = false;
        while y < y1 + self.radius {
            let mut x = x0 + if odd_row { self.dx / 2.0 } else { 0.0 };
            while x < x1 + self.dx / 2.0 {
                centers.push((x, y));
                x += self.dx;
            }
            y += self.dy;
            odd_row = !odd_row;
        }

        centers
    }

    /// Relative SVG path of one hexagon centred on the current origin.
    pub fn hexagon_path(&self) -> String {
        let mut out = String::from("m");
        let (mut x0, mut y0) = (0.0, 0.0);

        for (k, (x1, y1)) in self.corners().into_iter().enumerate() {
            if k > 0 {
                out.push('l');
            }
            out.push_str(&format!("{},{}", fmt_num(x1 - x0), fmt_num(y1 - y0)));
            x0 = x1;
            y0 = y1;
        }

        out.push('z');
        out
    }

    /// Absolute corner offsets, starting at the top vertex and going clockwise.
    pub fn corners(&self) -> [(f64, f64); 6] {
        let mut corners = [(0.0, 0.0); 6];
        for (k, corner) in corners.iter_mut().enumerate() {
            let angle = k as f64 * PI / 3.0;
            *corner = (angle.sin() * self.radius, -angle.cos() * self.radius);
        }
        corners
    }
}

fn odd(j: i64) -> f64 {
    (j & 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Hexbin {
        Hexbin::new(4.5, [[0.0, 0.0], [900.0, 700.0]])
    }

    fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    #[test]
    fn same_cell_groups_points() {
        let hexbin = canvas();
        let bins = hexbin.bin(vec![(100.0, 100.0), (100.5, 100.2), (300.0, 300.0)]);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].members, vec![0, 1]);
        assert_eq!(bins[1].members, vec![2]);
    }

    #[test]
    fn nan_positions_are_skipped() {
        let bins = canvas().bin(vec![(f64::NAN, 1.0), (10.0, 10.0)]);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].members, vec![1]);
    }

    #[test]
    fn points_stay_close_to_their_cell() {
        let hexbin = canvas();

        let mut x = 0.0;
        while x <= 900.0 {
            let mut y = 0.0;
            while y <= 700.0 {
                let (i, j) = hexbin.cell_of(x, y);
                let own_distance = distance((x, y), hexbin.center(i, j));
                // Grid-unit tie breaks overshoot the circumradius by under 4%.
                assert!(own_distance <= 4.5 * 1.04, "({x}, {y}) is {own_distance} from its centre");
                y += 3.7;
            }
            x += 4.3;
        }
    }

    #[test]
    fn row_boundary_compares_grid_units() {
        let hexbin = canvas();
        // In pixels (3.897, 6.75) is nearer, but in grid units the row 0 centre wins.
        let (x, y) = (3.3125, 2.7);
        assert!(distance((x, y), hexbin.center(0, 1)) < distance((x, y), hexbin.center(0, 0)));
        assert_eq!(hexbin.cell_of(x, y), (0, 0));

        // Well past the boundary both measures agree on the next row.
        assert_eq!(hexbin.cell_of(3.6, 5.0), (0, 1));
    }

    #[test]
    fn grid_covers_extent() {
        let hexbin = canvas();
        let centers = hexbin.centers();
        let dx = 4.5 * 2.0 * (PI / 3.0).sin();
        let cols = (900.0_f64 / dx + 0.5).ceil() as usize;
        assert!(centers.len() >= cols * (700.0_f64 / (4.5 * 1.5)).ceil() as usize);

        // Every assigned cell centre is one of the grid centres.
        for (x, y) in [(0.0, 0.0), (899.9, 699.9), (450.0, 350.0), (3.9, 6.7)] {
            let (i, j) = hexbin.cell_of(x, y);
            let c = hexbin.center(i, j);
            assert!(centers.iter().any(|&g| distance(g, c) < 1e-6), "centre {:?} missing", c);
        }
    }

    #[test]
    fn hexagon_path_for_default_radius() {
        assert_eq!(
            canvas().hexagon_path(),
            "m0,-4.5l3.897,2.25l0,4.5l-3.897,2.25l-3.897,-2.25l0,-4.5z"
        );
    }
}
