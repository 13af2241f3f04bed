//! Property tests for rule reconciliation and the settings store

use llmconf_providers::{CanonicalModelInfo, ProviderConfig};
use llmconf_storage::{
    compute_modified_flag, dedupe, is_built_in, parse_bounded, reconcile, select_defaults,
    MemoryStorage, ParameterRule, SettingsStore, RULE_EPSILON, SUPPORTED_LOCALES,
};
use proptest::prelude::*;

fn user_rule_strategy() -> impl Strategy<Value = ParameterRule> {
    ("[a-d]", "[W-Z]", 0.0f64..=1.0, 1u32..=10, 0.0f64..=2.0).prop_map(
        |(id, name, similarity, top_n, temperature)| ParameterRule {
            id: format!("user-{}", id),
            name,
            description: String::new(),
            similarity,
            top_n,
            temperature,
            prompt: String::new(),
            is_default: false,
            language: "en-US".to_string(),
        },
    )
}

fn locale_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["zh-CN", "zh-tw", "en-US", "en-GB", "ja-JP", "fr-FR"])
}

proptest! {
    #[test]
    fn prop_dedupe_leaves_unique_ids_and_names(rules in prop::collection::vec(user_rule_strategy(), 0..12)) {
        let outcome = dedupe(&rules);

        let mut ids: Vec<_> = outcome.rules.iter().map(|r| r.id.clone()).collect();
        let mut names: Vec<_> = outcome.rules.iter().map(|r| r.name.clone()).collect();
        ids.sort();
        ids.dedup();
        names.sort();
        names.dedup();

        prop_assert_eq!(ids.len(), outcome.rules.len());
        prop_assert_eq!(names.len(), outcome.rules.len());
        prop_assert_eq!(outcome.rules.len() + outcome.dropped, rules.len());
        prop_assert_eq!(dedupe(&outcome.rules).dropped, 0);
    }

    #[test]
    fn prop_reconcile_always_carries_both_built_ins(
        rules in prop::collection::vec(user_rule_strategy(), 0..6),
        modified in any::<bool>(),
        locale in locale_strategy(),
    ) {
        let outcome = reconcile(&rules, modified, locale);
        let built_ins: Vec<_> = outcome.rules.iter().filter(|r| is_built_in(&r.id)).collect();
        prop_assert_eq!(built_ins.len(), 2);
        prop_assert!(outcome.rules.iter().take(2).all(|r| is_built_in(&r.id)));
    }

    #[test]
    fn prop_unmodified_reconcile_yields_no_drift(
        rules in prop::collection::vec(user_rule_strategy(), 0..6),
        locale in locale_strategy(),
    ) {
        let outcome = reconcile(&rules, false, locale);
        prop_assert!(!compute_modified_flag(&outcome.rules, &select_defaults(locale)));
    }

    #[test]
    fn prop_drift_below_epsilon_is_ignored(
        delta in -0.9f64..0.9,
        locale in prop::sample::select(SUPPORTED_LOCALES.to_vec()),
    ) {
        let canonical = select_defaults(locale);
        let mut current = canonical.clone();
        current[0].temperature += delta * RULE_EPSILON;
        current[1].similarity -= delta * RULE_EPSILON;
        prop_assert!(!compute_modified_flag(&current, &canonical));
    }

    #[test]
    fn prop_parse_bounded_matches_range(value in -5.0f64..5.0) {
        let parsed = parse_bounded("temperature", &value.to_string(), 0.0, 2.0);
        prop_assert_eq!(parsed.is_ok(), (0.0..=2.0).contains(&value));
    }

    #[test]
    fn prop_save_then_load_is_identity(
        model_ids in prop::collection::vec("[a-f]{1,4}", 0..6),
        locale in locale_strategy(),
    ) {
        let storage = MemoryStorage::new();
        let mut store = SettingsStore::new();
        store.set_language(locale);
        store
            .upsert_provider(ProviderConfig::new("OpenAI", "https://api.openai.com/v1"), None)
            .unwrap();
        let selection: Vec<_> = model_ids.into_iter().map(CanonicalModelInfo::from_id).collect();
        store.add_models("OpenAI", &selection).unwrap();

        let reloaded = tokio_test::block_on(async {
            store.save(&storage).await.unwrap();
            SettingsStore::load(&storage).await.unwrap()
        });

        prop_assert_eq!(reloaded, store);
    }
}
