#![allow(dead_code)] // Not every test binary uses every strategy

use proptest::prelude::*;
use std::sync::Arc;
use target_resolver::models::{TargetSpecification, TargetType, UniqueId, ValueProperties};

/// Strategy for generating identifier schemes
pub fn scheme_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{1,7}"
}

/// Strategy for generating unique ids, sometimes versioned
pub fn unique_id_strategy() -> impl Strategy<Value = UniqueId> {
    (
        scheme_strategy(),
        "[a-zA-Z0-9]{1,12}",
        prop::option::of("[0-9]{1,4}"),
    )
        .prop_map(|(scheme, value, version)| {
            let id = UniqueId::of(scheme, value);
            match version {
                Some(version) => id.with_version(version),
                None => id,
            }
        })
}

/// Strategy for generating the non-null leaf target types
pub fn leaf_type_strategy() -> impl Strategy<Value = TargetType> {
    prop_oneof![
        Just(TargetType::Primitive),
        Just(TargetType::Security),
        Just(TargetType::Position),
        Just(TargetType::Trade),
        Just(TargetType::PortfolioNode),
    ]
}

/// Strategy for generating leaf types and combinators over them
pub fn target_type_strategy() -> impl Strategy<Value = TargetType> {
    prop_oneof![
        3 => leaf_type_strategy(),
        1 => prop::collection::vec(leaf_type_strategy(), 1..4).prop_map(TargetType::multiple),
        1 => prop::collection::vec(leaf_type_strategy(), 1..4).prop_map(TargetType::nested),
    ]
}

/// Strategy for generating specifications with a containment chain of up to three levels
pub fn specification_strategy() -> impl Strategy<Value = Arc<TargetSpecification>> {
    prop::collection::vec((leaf_type_strategy(), unique_id_strategy()), 1..4).prop_map(|chain| {
        let mut links = chain.into_iter();
        let (target_type, unique_id) = links.next().unwrap();
        let mut spec = Arc::new(TargetSpecification::new(target_type, unique_id).unwrap());
        for (target_type, unique_id) in links {
            spec = Arc::new(spec.containing(target_type, unique_id).unwrap());
        }
        spec
    })
}

/// Strategy for generating property sets
pub fn value_properties_strategy() -> impl Strategy<Value = ValueProperties> {
    prop::collection::btree_map(
        "[A-Z][a-zA-Z]{0,9}",
        prop::collection::btree_set("[A-Z]{3}", 1..3),
        0..4,
    )
    .prop_map(|properties| {
        properties
            .into_iter()
            .fold(ValueProperties::new(), |props, (name, values)| {
                values
                    .into_iter()
                    .fold(props, |props, value| props.with(name.clone(), value))
            })
    })
}
