//! Property-based invariants for projection, pooling, and viewport math.
//!
//! 1. Projected shape is `(dim(y), dim(x))` for every valid axis pair
//! 2. Projection reads exactly the pinned elements
//! 3. Invalid axis selection never changes the projector
//! 4. Pooled shape is `(ceil(H/k), ceil(W/k))` and every cell is its block max
//! 5. Zoom by `f` then `1/f` at the same anchor restores the viewport
//! 6. Rejected viewport operations leave the viewport unchanged

use ndarray::{Array2, ArrayD, IxDyn};
use proptest::prelude::*;
use tscope_render::lod::{pool_max, pool_size};
use tscope_render::projection::{AxisProjector, ProjectionError};
use tscope_render::viewport::Viewport;

// ── Strategies ──────────────────────────────────────────────────────────

fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 2..6)
}

fn iota(shape: &[usize]) -> ArrayD<i32> {
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n as i32).collect()).unwrap()
}

fn grid_strategy() -> impl Strategy<Value = Array2<i32>> {
    (1usize..20, 1usize..20).prop_flat_map(|(h, w)| {
        prop::collection::vec(-1000i32..1000, h * w)
            .prop_map(move |v| Array2::from_shape_vec((h, w), v).unwrap())
    })
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Projection shape and content
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn projection_shape_and_content(
        shape in shape_strategy(),
        y_pick in any::<prop::sample::Index>(),
        x_pick in any::<prop::sample::Index>(),
        idx_seed in any::<u64>(),
    ) {
        let ndim = shape.len();
        let y = y_pick.index(ndim);
        let x = x_pick.index(ndim);
        prop_assume!(y != x);

        let array = iota(&shape);
        let mut projector = AxisProjector::new(&shape);
        projector.select_axes(y, x).unwrap();
        let mut seed = idx_seed;
        for axis in (0..ndim).filter(|&a| a != y && a != x) {
            let index = (seed % shape[axis] as u64) as usize;
            seed /= 7;
            projector.set_fixed_index(axis, index).unwrap();
        }

        let view = projector.project(&array).unwrap();
        prop_assert_eq!(view.dim(), (shape[y], shape[x]));

        let mut full = vec![0usize; ndim];
        for (&axis, &index) in projector.state().fixed_indices() {
            full[axis] = index;
        }
        for r in 0..shape[y] {
            for c in 0..shape[x] {
                full[y] = r;
                full[x] = c;
                prop_assert_eq!(view[[r, c]], array[full.as_slice()]);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Failed selection is a no-op
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invalid_selection_keeps_state(shape in shape_strategy(), axis in 0usize..8) {
        let mut projector = AxisProjector::new(&shape);
        let before = projector.clone();
        let dup = projector.select_axes(axis, axis);
        let is_dup = matches!(dup, Err(ProjectionError::DuplicateAxis { .. }));
        prop_assert!(is_dup);
        prop_assert_eq!(&projector, &before);

        let out_of_range = projector.select_axes(0, shape.len() + axis);
        prop_assert!(out_of_range.is_err());
        prop_assert_eq!(&projector, &before);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Pooling
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pooled_cells_are_block_maxima(grid in grid_strategy(), k in 1usize..7) {
        let (h, w) = grid.dim();
        let pooled = pool_max(grid.view(), k);
        prop_assert_eq!(pooled.dim(), (h.div_ceil(k), w.div_ceil(k)));
        for ((r, c), &cell) in pooled.indexed_iter() {
            let mut expected = i32::MIN;
            for rr in r * k..((r + 1) * k).min(h) {
                for cc in c * k..((c + 1) * k).min(w) {
                    expected = expected.max(grid[[rr, cc]]);
                }
            }
            prop_assert_eq!(cell, expected);
        }
    }

    #[test]
    fn pool_size_one_is_identity(grid in grid_strategy()) {
        prop_assert_eq!(pool_max(grid.view(), 1), grid);
    }

    #[test]
    fn pool_size_tracks_ratio(vw in 0.1f64..10_000.0, sw in 1u32..4000) {
        let k = pool_size(vw, sw);
        let ratio = vw / f64::from(sw);
        if ratio > 1.5 {
            prop_assert_eq!(k, ratio.ceil() as usize);
        } else {
            prop_assert_eq!(k, 1);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5–6. Viewport
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zoom_round_trip(
        h in 1usize..500,
        w in 1usize..500,
        factor in 1.01f64..8.0,
        ax in -100.0f64..600.0,
        ay in -100.0f64..600.0,
    ) {
        let start = Viewport::fit(h, w, None).unwrap();
        let mut vp = start;
        vp.zoom(factor, ax, ay).unwrap();
        vp.zoom(1.0 / factor, ax, ay).unwrap();
        let tol = 1e-9 * (h.max(w) as f64 + 700.0);
        prop_assert!((vp.x_range().0 - start.x_range().0).abs() < tol);
        prop_assert!((vp.x_range().1 - start.x_range().1).abs() < tol);
        prop_assert!((vp.y_range().0 - start.y_range().0).abs() < tol);
        prop_assert!((vp.y_range().1 - start.y_range().1).abs() < tol);
    }

    #[test]
    fn rejected_operations_are_no_ops(h in 1usize..100, w in 1usize..100, bad in prop_oneof![
        Just(f64::NAN), Just(f64::INFINITY), Just(-1.0), Just(0.0)
    ]) {
        let start = Viewport::fit(h, w, None).unwrap();
        let mut vp = start;
        prop_assert!(vp.zoom(bad, 0.0, 0.0).is_err());
        prop_assert_eq!(vp, start);
        if !bad.is_finite() {
            prop_assert!(vp.pan(bad, 0.0).is_err());
            prop_assert_eq!(vp, start);
        }
    }
}
