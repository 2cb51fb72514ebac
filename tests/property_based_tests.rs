mod common;

use common::strategies::*;
use proptest::prelude::*;
use std::sync::Arc;
use target_resolver::interning::normalize;
use target_resolver::models::{TargetSpecification, TargetType, UniqueId, ValueProperties};

proptest! {
    /// Property: normalizing equal specifications built separately yields one instance
    #[test]
    fn equal_specifications_normalize_to_one_instance(spec in specification_strategy()) {
        let copy: TargetSpecification = (*spec).clone();
        let a = normalize(spec);
        let b = normalize(Arc::new(copy));
        prop_assert!(Arc::ptr_eq(&a, &b));
        prop_assert!(Arc::ptr_eq(&normalize(a.clone()), &a));
    }

    /// Property: normalization never changes the value
    #[test]
    fn normalization_preserves_equality(spec in specification_strategy()) {
        let expected: TargetSpecification = (*spec).clone();
        prop_assert_eq!(&*normalize(spec), &expected);
    }

    /// Property: equal property sets converge as well
    #[test]
    fn value_properties_converge(props in value_properties_strategy()) {
        let a = normalize(Arc::new(props.clone()));
        let b = normalize(Arc::new(props));
        prop_assert!(Arc::ptr_eq(&a, &b));
    }

    /// Property: unique ids survive their text form
    #[test]
    fn unique_ids_parse_their_display(id in unique_id_strategy()) {
        let parsed = UniqueId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(parsed, id);
    }

    /// Property: primitive accepts every non-null type
    #[test]
    fn primitive_is_compatible_with_everything(target_type in target_type_strategy()) {
        prop_assert!(TargetType::Primitive.is_compatible_type(&target_type));
    }

    /// Property: every leaf type is compatible with itself
    #[test]
    fn leaf_types_are_self_compatible(target_type in leaf_type_strategy()) {
        prop_assert!(target_type.is_compatible_type(&target_type));
    }

    /// Property: multiple() never nests and never repeats a member
    #[test]
    fn multiple_is_flat_and_distinct(
        first in prop::collection::vec(leaf_type_strategy(), 1..4),
        second in prop::collection::vec(leaf_type_strategy(), 1..4),
    ) {
        let combined = TargetType::multiple([TargetType::multiple(first), TargetType::multiple(second)]);
        if let TargetType::Multiple(members) = &combined {
            prop_assert!(members.len() >= 2);
            prop_assert!(members.iter().all(|m| !matches!(m, TargetType::Multiple(_))));
            for (i, member) in members.iter().enumerate() {
                prop_assert!(!members[i + 1..].contains(member));
            }
        }
    }

    /// Property: a nested type resolves to the innermost link of its chain
    #[test]
    fn containing_chains_end_in_the_inner_type(spec in specification_strategy()) {
        let leaf = spec.target_type().leaf().cloned();
        let inner = Arc::new(spec.containing(TargetType::Trade, UniqueId::of("Leaf", "1")).unwrap());
        prop_assert_eq!(inner.target_type().leaf(), Some(&TargetType::Trade));
        prop_assert!(leaf.is_some());
    }

    /// Property: a set of properties satisfies itself
    #[test]
    fn properties_satisfy_themselves(props in value_properties_strategy()) {
        prop_assert!(props.is_satisfied_by(&props));
        prop_assert!(ValueProperties::new().is_satisfied_by(&props));
    }
}
