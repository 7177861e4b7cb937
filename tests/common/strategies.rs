use multiqueue::messaging::{ArgumentSet, Kwargs};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for small JSON scalars used as arguments
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-z]{0,8}".prop_map(|s| json!(s)),
        Just(Value::Null),
    ]
}

/// Strategy for keyword argument maps
pub fn kwargs_strategy() -> impl Strategy<Value = Kwargs> {
    prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..3)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for one job's arguments
pub fn argument_set_strategy() -> impl Strategy<Value = ArgumentSet> {
    (
        prop::collection::vec(scalar_strategy(), 0..4),
        kwargs_strategy(),
    )
        .prop_map(|(args, kwargs)| ArgumentSet::new(args, kwargs))
}

/// Strategy for a whole batch of argument sets (possibly empty)
pub fn batch_strategy() -> impl Strategy<Value = Vec<ArgumentSet>> {
    prop::collection::vec(argument_set_strategy(), 0..24)
}
