//! Property tests for bound normalization during translation

use proptest::prelude::*;
use schemaflow_core::Schema;
use schemaflow_rules::translate;
use serde_json::json;

proptest! {
    /// Legacy flags and modern numeric bounds translate to the same record
    #[test]
    fn bounds_normalize_across_drafts(low in -1000i64..1000, span in 1i64..1000, exclusive in any::<bool>()) {
        let high = low + span;
        let legacy = Schema::from_value(&json!({"properties": {"n": {
            "type": "number",
            "minimum": low,
            "maximum": high,
            "exclusiveMinimum": exclusive,
            "exclusiveMaximum": exclusive
        }}})).unwrap();
        let modern = if exclusive {
            json!({"type": "number", "exclusiveMinimum": low, "exclusiveMaximum": high})
        } else {
            json!({"type": "number", "minimum": low, "maximum": high})
        };
        let modern = Schema::from_value(&json!({"properties": {"n": modern}})).unwrap();

        let legacy = translate(&legacy).unwrap();
        let modern = translate(&modern).unwrap();
        let (a, b) = (&legacy[0].constraints, &modern[0].constraints);
        prop_assert_eq!(a.min, Some(low as f64));
        prop_assert_eq!(a.max, Some(high as f64));
        prop_assert_eq!((a.min, a.max, a.exclusive_min, a.exclusive_max), (b.min, b.max, b.exclusive_min, b.exclusive_max));
        prop_assert_eq!(a.exclusive_min, exclusive);
    }
}
