//! Linear value → pixel mappings and axis tick generation.

/// Min and max of `values`, ignoring NaN. `None` when nothing is comparable.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Affine map from a numeric domain onto a numeric range. Unclamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// A degenerate domain sends every input to the middle of the range.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        let t = if span != 0.0 { (value - d0) / span } else { 0.5 };
        r0 + (r1 - r0) * t
    }

    /// Roughly `count` round-numbered values inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

/// Round-numbered tick values (steps of 1, 2 or 5 × 10^k) between `start` and `stop`.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };

    let Some((i1, i2, inc)) = tick_increment(lo, hi, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }

    let mut out: Vec<f64> = (0..=(i2 - i1) as i64)
        .map(|k| {
            let i = i1 + k as f64;
            // Negative increments encode 1/step to keep decimal ticks exact.
            if inc < 0.0 { i / -inc } else { i * inc }
        })
        .collect();

    if reverse {
        out.reverse();
    }
    out
}

fn tick_increment(start: f64, stop: f64, count: f64) -> Option<(f64, f64, f64)> {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round();
        i2 = (stop * inv).round();
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        inc = -inv;
    } else {
        let step = 10f64.powf(power) * factor;
        i1 = (start / step).round();
        i2 = (stop / step).round();
        if i1 * step < start {
            i1 += 1.0;
        }
        if i2 * step > stop {
            i2 -= 1.0;
        }
        inc = step;
    }

    if !i1.is_finite() || !i2.is_finite() {
        return None;
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_increment(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_skips_nan() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn inverted_range_puts_max_on_top() {
        let y = LinearScale::new((10.0, 20.0), (650.0, 50.0));
        assert_eq!(y.apply(10.0), 650.0);
        assert_eq!(y.apply(20.0), 50.0);
        assert_eq!(y.apply(15.0), 350.0);
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let x = LinearScale::new((4.0, 4.0), (50.0, 850.0));
        assert_eq!(x.apply(4.0), 450.0);
        assert_eq!(x.apply(100.0), 450.0);
    }

    #[test]
    fn legend_ticks_step_by_five_percent() {
        let legend = LinearScale::new((0.0, 0.225), (0.0, 230.0));
        let ticks = legend.ticks(5);
        assert_eq!(ticks, vec![0.0, 0.05, 0.1, 0.15, 0.2]);
    }

    #[test]
    fn integer_ticks() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(10.0, 0.0, 5), vec![10.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
        assert_eq!(ticks(1.0, 1.0, 5), vec![1.0]);
    }
}
