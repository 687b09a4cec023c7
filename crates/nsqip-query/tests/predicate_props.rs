use proptest::prelude::*;

use nsqip_model::Scalar;
use nsqip_query::Predicate;

fn arb_column() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,11}"
}

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::from),
        (-10_000i64..10_000).prop_map(Scalar::from),
        (-1.0e6..1.0e6f64).prop_map(Scalar::from),
        "[A-Z][A-Z0-9.]{0,8}".prop_map(Scalar::from),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (arb_column(), prop::collection::vec(arb_scalar(), 1..4))
            .prop_map(|(column, allowed)| Predicate::membership(column, allowed)
                .expect("constructed membership is valid")),
        (arb_column(), -10_000i64..10_000, -10_000i64..10_000).prop_map(
            |(column, a, b)| Predicate::range(column, a.min(b), a.max(b))
                .expect("constructed range is valid")
        ),
        (arb_column(), arb_scalar()).prop_map(|(column, value)| Predicate::equals(column, value)
            .expect("constructed equality is valid")),
    ]
}

fn arb_predicate() -> impl Strategy<Value = Predicate> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Predicate::and_all),
            prop::collection::vec(inner, 0..4).prop_map(Predicate::or_any),
        ]
    })
}

proptest! {
    #[test]
    fn constructed_trees_always_validate(predicate in arb_predicate()) {
        prop_assert!(predicate.validate().is_ok());
    }

    #[test]
    fn json_round_trip_preserves_the_tree(predicate in arb_predicate()) {
        let json = serde_json::to_string(&predicate).expect("serialize");
        let back: Predicate = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(&back, &predicate);
        prop_assert!(back.validate().is_ok());
    }

    #[test]
    fn compilation_never_panics_on_valid_trees(predicate in arb_predicate()) {
        let _ = predicate.to_expr();
    }

    #[test]
    fn empty_membership_lists_fail_validation(column in arb_column()) {
        let predicate = Predicate::Membership { column, allowed: vec![] };
        prop_assert!(predicate.validate().is_err());
    }
}
