//! Character heatmaps of a rendered [`View`].
//!
//! One character per grid cell, shaded by `value / vmax`. Only cells whose
//! data-space center lies inside the viewport are printed, so zooming in
//! crops the picture the way a plot's axis limits would.

use tscope::{Grid, View, Viewport};

/// Darkest to brightest.
pub const RAMP: &[u8] = b" .:-=+*#%@";

/// Shade for one value; NaN prints as `?`.
#[must_use]
pub fn shade(value: f64, vmax: f64) -> char {
    if value.is_nan() {
        return '?';
    }
    let t = if vmax > 0.0 { value / vmax } else { 0.0 };
    let t = t.clamp(0.0, 1.0);
    let last = RAMP.len() - 1;
    let i = (t * last as f64).round() as usize;
    char::from(RAMP[i.min(last)])
}

fn visible(index: usize, pool: usize, lo: f64, hi: f64) -> bool {
    let center = (index * pool) as f64 + (pool as f64 - 1.0) / 2.0;
    center >= lo && center <= hi
}

fn grid_lines(grid: &Grid<'_>, pool: usize, vmax: f64, viewport: Option<&Viewport>) -> Vec<String> {
    let (rows, cols) = grid.dim();
    let (x_lo, x_hi) = viewport.map_or((f64::NEG_INFINITY, f64::INFINITY), Viewport::x_range);
    let (y_lo, y_hi) = viewport.map_or((f64::NEG_INFINITY, f64::INFINITY), |vp| {
        let (a, b) = vp.y_range();
        (a.min(b), a.max(b))
    });
    let pool = pool.max(1);
    (0..rows)
        .filter(|&r| visible(r, pool, y_lo, y_hi))
        .map(|r| {
            (0..cols)
                .filter(|&c| visible(c, pool, x_lo, x_hi))
                .map(|c| grid.get(r, c).map_or(' ', |v| shade(v, vmax)))
                .collect()
        })
        .collect()
}

/// Title line, shaded rows, and a legend.
#[must_use]
pub fn render_lines(view: &View<'_>, viewport: Option<&Viewport>) -> Vec<String> {
    match view {
        View::NoData { title } => vec![title.clone()],
        View::Image {
            grid,
            title,
            pool_size,
            value_range,
            ..
        } => {
            let mut lines = vec![title.clone()];
            lines.extend(grid_lines(grid, *pool_size, value_range.vmax, viewport));
            lines.push(format!(
                "range {:.4} .. {:.4}  ramp \"{}\"",
                value_range.vmin,
                value_range.vmax,
                String::from_utf8_lossy(RAMP)
            ));
            lines
        }
    }
}
