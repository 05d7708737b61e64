//! Property-based invariants for comparison and severity aggregation.
//!
//! 1. `MSE(a, a) == 0` and `MSE(a, b) == MSE(b, a)`
//! 2. Pointwise difference has the operand shape and is non-negative
//! 3. Every internal node carries the max of its descendants' severities
//! 4. Propagation is idempotent and independent of result order
//! 5. Colors exist exactly for nodes with a severity

use std::collections::BTreeMap;

use proptest::prelude::*;
use tscope_core::identifier::Identifier;
use tscope_core::tensor::Tensor;
use tscope_diff::batch::DiffResult;
use tscope_diff::diff::{mean_squared_error, pointwise_diff};
use tscope_diff::namespace::{NamespaceTree, NodeId};
use tscope_style::SeverityScale;

// ── Strategies ──────────────────────────────────────────────────────────

fn tensor_pair() -> impl Strategy<Value = (Tensor, Tensor)> {
    prop::collection::vec(1usize..5, 0..4).prop_flat_map(|shape| {
        let n: usize = shape.iter().product();
        let values = prop::collection::vec(-1e3f32..1e3, n);
        (values.clone(), values).prop_map(move |(a, b)| {
            (
                Tensor::from_f32(&shape, a).unwrap(),
                Tensor::from_f32(&shape, b).unwrap(),
            )
        })
    })
}

fn identifier() -> impl Strategy<Value = Identifier> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "rec1", "rec2"]), 1..5)
        .prop_map(|segs| Identifier::from_segments(segs).unwrap())
}

fn results() -> impl Strategy<Value = Vec<DiffResult>> {
    prop::collection::vec(
        (identifier(), identifier(), 0.0f64..100.0).prop_map(|(left, right, m)| DiffResult {
            left,
            right,
            error_magnitude: m,
        }),
        0..12,
    )
}

fn severities(tree: &NamespaceTree) -> BTreeMap<String, Option<f64>> {
    tree.post_order()
        .into_iter()
        .map(|n| (tree.path(n).to_string(), tree.severity(n)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Elementwise comparison
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mse_self_zero_and_symmetric((a, b) in tensor_pair()) {
        prop_assert_eq!(mean_squared_error(&a, &a).unwrap(), 0.0);
        prop_assert_eq!(mean_squared_error(&a, &b).unwrap(), mean_squared_error(&b, &a).unwrap());
        prop_assert!(mean_squared_error(&a, &b).unwrap() >= 0.0);
    }

    #[test]
    fn pointwise_diff_shape_and_sign((a, b) in tensor_pair()) {
        let d = pointwise_diff(&a, &b).unwrap();
        prop_assert_eq!(d.shape(), a.shape());
        let shape = d.shape().to_vec();
        let mut index = vec![0usize; shape.len()];
        for _ in 0..d.len() {
            prop_assert!(d.value_at(&index).unwrap() >= 0.0);
            for axis in (0..shape.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3–5. Namespace tree
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn internal_nodes_hold_descendant_max(results in results()) {
        let mut tree = NamespaceTree::new();
        tree.apply_diff_results(&results);
        for node in tree.post_order() {
            let children = tree
                .children(node)
                .filter_map(|c| tree.severity(c))
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
            let expected = match (tree.own_severity(node), children) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, None) => a,
                (None, b) => b,
            };
            prop_assert_eq!(tree.severity(node), expected);
        }
        let max = results.iter().map(|r| r.error_magnitude).fold(None, |acc: Option<f64>, m| {
            Some(acc.map_or(m, |a| a.max(m)))
        });
        prop_assert_eq!(tree.global_max(), max);
    }

    #[test]
    fn propagation_idempotent_and_order_free(results in results()) {
        let mut forward = NamespaceTree::new();
        forward.apply_diff_results(&results);
        let snapshot = severities(&forward);
        forward.propagate();
        prop_assert_eq!(severities(&forward), snapshot.clone());

        let mut reversed_results = results.clone();
        reversed_results.reverse();
        let mut backward = NamespaceTree::new();
        backward.apply_diff_results(&reversed_results);
        prop_assert_eq!(severities(&backward), snapshot);
    }

    #[test]
    fn colors_follow_severity(results in results()) {
        let scale = SeverityScale::default();
        let mut tree = NamespaceTree::new();
        tree.apply_diff_results(&results);
        for node in tree.post_order() {
            prop_assert_eq!(tree.color_for(node, &scale).is_some(), tree.severity(node).is_some());
        }
        prop_assert_eq!(tree.color_for(NodeId::ROOT, &scale).is_some(), !results.is_empty());
    }
}
