//! Property-based tests for the participant color cache.

use parley_app::{ColorCache, Rgb};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_lookups_are_stable_within_a_session(
        names in prop::collection::vec("[a-z]{1,10}", 1..20),
    ) {
        let cache = ColorCache::new();
        let first: Vec<Rgb> = names.iter().map(|n| cache.color_for(n)).collect();
        let second: Vec<Rgb> = names.iter().map(|n| cache.color_for(n)).collect();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_cache_holds_each_distinct_name_once(
        names in prop::collection::vec("[a-z]{1,4}", 0..30),
    ) {
        let cache = ColorCache::new();
        for name in &names {
            cache.color_for(name);
        }

        let mut distinct = names.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(cache.names(), distinct);
    }

    #[test]
    fn prop_blank_names_are_black(spaces in " {0,8}") {
        let cache = ColorCache::new();

        prop_assert_eq!(cache.color_for(&spaces), Rgb::BLACK);
        prop_assert!(cache.is_empty());
    }

    #[test]
    fn prop_sessions_agree_on_colors(name in "[A-Za-z0-9_]{1,16}") {
        prop_assert_eq!(ColorCache::new().color_for(&name), ColorCache::new().color_for(&name));
    }
}
