use super::*;
use std::{sync::Arc, time::Duration};
use serde_json::json;

use crate::test_support::{ok_json, ScriptedTransport};

#[tokio::test]
async fn network_failure_yields_documented_fallback_lists() {
    let transport = ScriptedTransport::new();
    transport
        .route("groups", Err(TransportError::Network("connection refused".into())))
        .await;
    transport
        .route("categories", Err(TransportError::Network("connection refused".into())))
        .await;
    let provider = OptionProvider::new(transport.clone());

    let options = provider.fetch_options().await;

    assert_eq!(
        options.groups,
        vec![
            "People with disabilities",
            "Elderly",
            "Students",
            "Children",
            "Low-income individuals"
        ]
    );
    assert_eq!(
        options.categories,
        vec![
            "Accessibility",
            "Mobility",
            "Cognitive",
            "Mental health",
            "Education",
            "Healthcare"
        ]
    );
    assert_eq!(provider.source().await, Some(OptionSource::Fallback));
}

#[tokio::test]
async fn one_failing_list_falls_back_for_the_whole_set() {
    let transport = ScriptedTransport::new();
    transport
        .route("groups", ok_json(json!({"groups": ["Veterans"]})))
        .await;
    transport
        .route("categories", Err(TransportError::Timeout(Duration::from_secs(30))))
        .await;
    let provider = OptionProvider::new(transport);

    assert_eq!(provider.fetch_options().await, fallback_options());
    assert_eq!(provider.source().await, Some(OptionSource::Fallback));
}

#[tokio::test]
async fn empty_or_malformed_remote_lists_fall_back() {
    let transport = ScriptedTransport::new();
    transport
        .route("groups", ok_json(json!({"groups": ["", "  "]})))
        .await;
    transport
        .route("categories", ok_json(json!({"unexpected": true})))
        .await;
    let provider = OptionProvider::new(transport);

    let options = provider.fetch_options().await;
    assert!(!options.groups.is_empty());
    assert!(!options.categories.is_empty());
    assert_eq!(provider.source().await, Some(OptionSource::Fallback));
}

#[tokio::test]
async fn remote_lists_are_cached_until_refresh() {
    let transport = ScriptedTransport::new();
    transport
        .route(
            "groups",
            ok_json(json!({"groups": ["Elderly", " Students ", "Elderly"]})),
        )
        .await;
    transport
        .route("categories", ok_json(json!({"categories": ["Mobility"]})))
        .await;
    let provider = OptionProvider::new(transport.clone());
    assert_eq!(provider.source().await, None);

    let first = provider.fetch_options().await;
    let second = provider.fetch_options().await;

    assert_eq!(first.groups, vec!["Elderly", "Students"]);
    assert_eq!(first.categories, vec!["Mobility"]);
    assert_eq!(first, second);
    assert_eq!(provider.source().await, Some(OptionSource::Remote));
    assert_eq!(transport.calls().await.len(), 2);

    transport
        .route("categories", ok_json(json!({"categories": ["Mobility", "Cognitive"]})))
        .await;
    let refreshed = provider.refresh().await;
    assert_eq!(refreshed.categories, vec!["Mobility", "Cognitive"]);
    assert_eq!(provider.fetch_options().await, refreshed);
    assert_eq!(transport.calls().await.len(), 4);
}

#[tokio::test]
async fn readers_are_not_blocked_while_first_fetch_is_in_flight() {
    let transport = ScriptedTransport::new();
    let groups_reply = transport.push_gated().await;
    let categories_reply = transport.push_gated().await;
    let provider = Arc::new(OptionProvider::new(transport.clone()));

    let fetch = tokio::spawn({
        let provider = provider.clone();
        async move { provider.fetch_options().await }
    });
    transport.wait_for_calls(2).await;

    let source = tokio::time::timeout(Duration::from_millis(200), provider.source())
        .await
        .expect("source() should not wait on the network");
    assert_eq!(source, None);

    let _ = groups_reply.send(ok_json(json!({"groups": ["Veterans"]})));
    let _ = categories_reply.send(ok_json(json!({"categories": ["Housing"]})));
    let options = fetch.await.expect("fetch task");

    assert_eq!(options.groups, vec!["Veterans"]);
    assert_eq!(options.categories, vec!["Housing"]);
    assert_eq!(provider.source().await, Some(OptionSource::Remote));
}
