//! Property tests for classification, URL building, auth headers and the model collection

use llmconf_providers::{
    add_models, build_chat_url, build_headers, build_models_url, classify, AuthType,
    CanonicalModelInfo, Dialect, ModelRecord, ProviderConfig,
};
use proptest::prelude::*;

fn endpoint_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["http", "https"]),
        "[a-z]{3,10}\\.(com|cn|io)",
        prop::option::of(1024u16..65535),
        prop::sample::select(vec!["", "/", "/v1", "/api/v3", "/compatible-mode/v1"]),
    )
        .prop_map(|(scheme, host, port, path)| match port {
            Some(port) => format!("{}://{}:{}{}", scheme, host, port, path),
            None => format!("{}://{}{}", scheme, host, path),
        })
}

fn provider_name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "OpenAI", "DeepSeek", "Claude", "Gemini", "Qwen", "Ollama", "Moonshot", "Zhipu GLM",
    ])
    .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn prop_anthropic_api_key_never_sets_authorization(
        endpoint in endpoint_strategy(),
        key in "[A-Za-z0-9-]{8,40}",
        locale in prop::sample::select(vec!["zh-CN", "en-US", "ja-JP"]),
    ) {
        let provider = ProviderConfig::new("Anthropic", endpoint).with_key(key.clone(), AuthType::ApiKey);
        let headers = build_headers(&provider, locale);

        prop_assert!(!headers.keys().any(|k| k.eq_ignore_ascii_case("authorization")));
        prop_assert_eq!(headers.get("x-api-key"), Some(&key));
    }

    #[test]
    fn prop_models_endpoint_override_is_returned_verbatim(
        name in provider_name_strategy(),
        endpoint in endpoint_strategy(),
        models_endpoint in endpoint_strategy(),
    ) {
        let provider = ProviderConfig::new(name, endpoint).with_models_endpoint(models_endpoint.clone());
        prop_assert_eq!(build_models_url(&provider).unwrap(), models_endpoint);
    }

    #[test]
    fn prop_chat_url_is_idempotent(
        name in provider_name_strategy(),
        endpoint in endpoint_strategy(),
    ) {
        let provider = ProviderConfig::new(name.clone(), endpoint);
        let once = build_chat_url(&provider).unwrap();
        prop_assert!(once.contains("/chat/completions"));

        let again = build_chat_url(&ProviderConfig::new(name, once.clone())).unwrap();
        prop_assert_eq!(again, once);
    }

    #[test]
    fn prop_models_url_has_single_separator(
        name in provider_name_strategy(),
        endpoint in endpoint_strategy(),
    ) {
        let provider = ProviderConfig::new(name, endpoint);
        let url = build_models_url(&provider).unwrap();
        let path = url.split_once("://").map(|(_, rest)| rest).unwrap_or(&url);
        prop_assert!(!path.contains("//"));
        prop_assert!(url.ends_with("/models"));
    }

    #[test]
    fn prop_explicit_type_wins_over_name(
        name in provider_name_strategy(),
        endpoint in endpoint_strategy(),
        dialect in prop::sample::select(Dialect::ALL.to_vec()),
    ) {
        let provider = ProviderConfig::new(name, endpoint).with_provider_type(dialect.as_str());
        prop_assert_eq!(classify(&provider), dialect);
    }

    #[test]
    fn prop_add_models_leaves_exactly_one_default(
        existing in prop::collection::vec(("[a-c]", "[a-e]", any::<bool>()), 0..8),
        added in prop::collection::vec("[a-e]", 0..6),
    ) {
        let mut models: Vec<ModelRecord> = existing
            .into_iter()
            .map(|(provider, name, is_default)| ModelRecord {
                is_default,
                ..ModelRecord::from_canonical(&provider, &CanonicalModelInfo::from_id(name))
            })
            .collect();
        let selection: Vec<CanonicalModelInfo> =
            added.into_iter().map(CanonicalModelInfo::from_id).collect();

        add_models(&mut models, "b", &selection);

        let defaults = models.iter().filter(|m| m.is_default).count();
        if models.is_empty() {
            prop_assert_eq!(defaults, 0);
        } else {
            prop_assert_eq!(defaults, 1);
        }

        for info in &selection {
            let copies = models
                .iter()
                .filter(|m| m.provider == "b" && m.name == info.id)
                .count();
            prop_assert!(copies >= 1);
        }
    }

    #[test]
    fn prop_add_models_twice_inserts_nothing(
        added in prop::collection::vec("[a-e]", 1..6),
    ) {
        let selection: Vec<CanonicalModelInfo> =
            added.into_iter().map(CanonicalModelInfo::from_id).collect();
        let mut models = Vec::new();

        add_models(&mut models, "p", &selection);
        let snapshot = models.clone();
        prop_assert_eq!(add_models(&mut models, "p", &selection), 0);
        prop_assert_eq!(models, snapshot);
    }
}
