//! Property-based test: `l2_normalize`'s `‖v‖₂ = 1 ± 1e-6` invariant (`§4.1`).

use proptest::prelude::*;

use weave_embed::l2_normalize;

proptest! {
    #[test]
    fn l2_normalize_yields_unit_norm_or_leaves_a_zero_vector_unchanged(
        values in proptest::collection::vec(-50.0f32..50.0, 2..8),
    ) {
        let original_norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = l2_normalize(values.clone());

        if original_norm < f32::EPSILON {
            prop_assert_eq!(normalized, values);
        } else {
            let norm = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-6, "norm was {norm}, expected ~1.0");
        }
    }
}
