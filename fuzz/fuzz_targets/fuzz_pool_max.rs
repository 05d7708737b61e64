#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ndarray::Array2;
use tscope_render::lod::pool_max;

#[derive(Debug, Arbitrary)]
struct Input {
    rows: u8,
    cols: u8,
    k: u8,
    values: Vec<i32>,
}

fuzz_target!(|input: Input| {
    let rows = usize::from(input.rows % 48) + 1;
    let cols = usize::from(input.cols % 48) + 1;
    let k = usize::from(input.k % 12) + 1;
    if input.values.is_empty() {
        return;
    }
    let slice = Array2::from_shape_fn((rows, cols), |(r, c)| {
        input.values[(r * cols + c) % input.values.len()]
    });

    let pooled = pool_max(slice.view(), k);
    assert_eq!(pooled.dim(), (rows.div_ceil(k), cols.div_ceil(k)));
    for ((r, c), &v) in slice.indexed_iter() {
        assert!(pooled[[r / k, c / k]] >= v);
    }
    for ((pr, pc), &m) in pooled.indexed_iter() {
        let block = slice.slice(ndarray::s![
            pr * k..((pr + 1) * k).min(rows),
            pc * k..((pc + 1) * k).min(cols)
        ]);
        assert!(block.iter().any(|&v| v == m));
    }
});
