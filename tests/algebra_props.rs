//! Property-based tests for the expression algebra and the model builder.

use linip::{FixedModel, Model, Sum, Variable, VariableType};
use proptest::prelude::*;

// Small integers keep every f64 sum exact.
fn small() -> impl Strategy<Value = i32> {
    -50i32..50
}

fn non_zero() -> impl Strategy<Value = i32> {
    prop_oneof![(-20i32..=-1), (1i32..=20)]
}

fn terms() -> impl Strategy<Value = (i32, Vec<(usize, i32)>)> {
    (small(), prop::collection::vec((0usize..6, small()), 0..8))
}

fn build(constant: i32, terms: &[(usize, i32)], vars: &[Variable]) -> Sum {
    let mut sum = Sum::new(f64::from(constant));
    for &(i, k) in terms {
        sum += f64::from(k) * vars[i];
    }
    sum
}

fn fixed_model(values: &[i32]) -> (FixedModel, Vec<Variable>) {
    let mut model = FixedModel::new();
    let vars = values
        .iter()
        .map(|&v| model.add_fixed_variable(f64::from(v)))
        .collect();
    (model, vars)
}

proptest! {
    #[test]
    fn addition_is_additive(
        values in prop::collection::vec(small(), 6),
        (ca, ta) in terms(),
        (cb, tb) in terms(),
    ) {
        let (model, vars) = fixed_model(&values);
        let a = build(ca, &ta, &vars);
        let b = build(cb, &tb, &vars);
        let va = a.value(&model).unwrap();
        let vb = b.value(&model).unwrap();
        prop_assert_eq!((&a + &b).value(&model).unwrap(), va + vb);
        prop_assert_eq!((&a - &b).value(&model).unwrap(), va - vb);
        prop_assert_eq!((-&a).value(&model).unwrap(), -va);
    }

    #[test]
    fn scaling_scales_the_value(
        values in prop::collection::vec(small(), 6),
        (c, t) in terms(),
        k in small(),
    ) {
        let (model, vars) = fixed_model(&values);
        let a = build(c, &t, &vars);
        let va = a.value(&model).unwrap();
        prop_assert_eq!((&a * f64::from(k)).value(&model).unwrap(), va * f64::from(k));
        prop_assert_eq!((f64::from(k) * a.clone()).value(&model).unwrap(), f64::from(k) * va);
    }

    #[test]
    fn rendering_lists_sorted_nonzero_terms((c, t) in terms()) {
        let (_, vars) = fixed_model(&[0; 6]);
        let sum = build(c, &t, &vars);
        let listed = sum.terms();
        prop_assert!(listed.windows(2).all(|w| w[0].0 < w[1].0));
        prop_assert!(listed.iter().all(|&(_, k)| k != 0.0));
    }

    #[test]
    fn single_variable_constraint_only_narrows_the_bound(k in non_zero(), rhs in small()) {
        let mut model = Model::new();
        let x = model.add_variable(VariableType::Continuous);
        let y = model.add_variable(VariableType::Continuous);
        model.add_constraint((f64::from(k) * x).le(f64::from(rhs)).unwrap()).unwrap();

        let ip = model.to_proto();
        prop_assert_eq!(ip.constraint.len(), 0);
        let bounds = model.variable(x).unwrap().bounds;
        let limit = f64::from(rhs) / f64::from(k);
        if k > 0 {
            prop_assert_eq!(bounds.upper, limit);
            prop_assert_eq!(bounds.lower, f64::NEG_INFINITY);
        } else {
            prop_assert_eq!(bounds.lower, limit);
            prop_assert_eq!(bounds.upper, f64::INFINITY);
        }
        prop_assert!(model.variable(y).unwrap().bounds.lower.is_infinite());
    }

    #[test]
    fn bounds_never_widen(steps in prop::collection::vec((small(), small()), 1..10)) {
        let mut model = Model::new();
        let x = model.add_variable(VariableType::Integer);
        for (a, b) in steps {
            let before = model.variable(x).unwrap().bounds;
            let result = model.add_bounds(Some(f64::from(a)), x, Some(f64::from(b)));
            let after = model.variable(x).unwrap().bounds;
            prop_assert!(after.lower >= before.lower);
            prop_assert!(after.upper <= before.upper);
            prop_assert!(after.lower <= after.upper);
            if result.is_err() {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn models_never_mix(ka in small(), kb in small()) {
        let mut a = FixedModel::new();
        let mut b = FixedModel::new();
        let x = a.add_fixed_variable(1.0);
        let y = b.add_fixed_variable(1.0);
        let left = f64::from(ka) * x + 1.0;
        let right = f64::from(kb) * y;
        if ka != 0 && kb != 0 {
            prop_assert!(left.checked_add(&right).is_err());
        }
        prop_assert!(Sum::from(x).checked_sub(y).is_err());
    }
}
