//! Unit tests for the command handler, covering every task dispatched by
//! `handle_command`, through the same code path used by the real
//! `tidytabs-rpc` binary.

use std::sync::Arc;

use serde_json::{json, Value};

use tidytabs::app::Coordinator;
use tidytabs::platform::MemoryPlatform;
use tidytabs::rpc_handler::{handle_command, push_line};
use tidytabs::services::preference_store::PreferenceStore;
use tidytabs::types::message::PushEvent;
use tidytabs::types::settings::CoordinatorConfig;

fn setup() -> (Arc<MemoryPlatform>, Coordinator<MemoryPlatform>) {
    let platform = Arc::new(MemoryPlatform::new());
    let prefs = PreferenceStore::in_memory().expect("Failed to open prefs");
    let (coordinator, _pushes) = Coordinator::new(Arc::clone(&platform), prefs, CoordinatorConfig::default());
    (platform, coordinator)
}

fn tab_ids(result: &Value, window_id: i64) -> Vec<i64> {
    result["windows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["id"] == window_id)
        .map(|w| w["tabs"].as_array().unwrap().iter().map(|t| t["id"].as_i64().unwrap()).collect())
        .unwrap_or_default()
}

// ─── Protocol ───

#[tokio::test]
async fn test_unknown_task_returns_error() {
    let (_platform, coordinator) = setup();
    let res = handle_command(&coordinator, &json!({"task": "explode"})).await;
    assert!(res.unwrap_err().starts_with("Malformed message"));
}

#[tokio::test]
async fn test_missing_field_returns_error() {
    let (_platform, coordinator) = setup();
    let res = handle_command(&coordinator, &json!({"task": "removeTabs"})).await;
    assert!(res.unwrap_err().contains("tabIds"));
}

#[tokio::test]
async fn test_request_id_is_ignored() {
    let (platform, coordinator) = setup();
    platform.open_window(&["a"]);
    let res = handle_command(&coordinator, &json!({"id": 7, "task": "init"})).await;
    assert!(res.is_ok());
}

// ─── Handshake ───

#[tokio::test]
async fn test_init_shape() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["https://a.example", "https://b.example"]);

    let res = handle_command(&coordinator, &json!({"task": "init"})).await.unwrap();

    assert_eq!(tab_ids(&res, window_id), tabs);
    assert_eq!(res["windows"][0]["type"], "normal");
    assert_eq!(res["windows"][0]["tabs"][0]["url"], "https://a.example");
    assert_eq!(res["visited"], json!([]));
    assert_eq!(res["prefs"], json!({"alwaysOnPanel": false, "hints": true}));
    assert_eq!(res["colorOf"], "");
    assert!(res.get("failures").is_none());
}

#[tokio::test]
async fn test_store_string_then_init() {
    let (_platform, coordinator) = setup();
    let res = handle_command(
        &coordinator,
        &json!({"task": "storeString", "name": "colorOf", "string": "{\"1\":\"teal\"}"}),
    )
    .await
    .unwrap();
    assert_eq!(res, json!({"ok": true}));

    let res = handle_command(&coordinator, &json!({"task": "init"})).await.unwrap();
    assert_eq!(res["colorOf"], "{\"1\":\"teal\"}");
}

#[tokio::test]
async fn test_popup_inactive() {
    let (_platform, coordinator) = setup();
    handle_command(&coordinator, &json!({"task": "init"})).await.unwrap();
    let res = handle_command(&coordinator, &json!({"task": "popupInactive"})).await.unwrap();
    assert_eq!(res, json!({"ok": true}));
    assert!(!coordinator.notifier().is_active());
}

// ─── Batches ───

#[tokio::test]
async fn test_remove_tabs_replies_with_fresh_tree() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b", "c"]);

    let res = handle_command(&coordinator, &json!({"task": "removeTabs", "tabIds": [tabs[0], tabs[2]]}))
        .await
        .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[1]]);
    assert!(res.get("prefs").is_none());
}

#[tokio::test]
async fn test_partial_failure_is_listed() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b"]);
    platform.set_failing(tabs[1]);

    let res = handle_command(&coordinator, &json!({"task": "removeTabs", "tabIds": tabs.clone()}))
        .await
        .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[1]]);
    assert_eq!(res["failures"][0]["target"], json!({"kind": "tab", "id": tabs[1]}));
    assert!(res["failures"][0]["error"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_remove_windows() {
    let (platform, coordinator) = setup();
    let (w1, _) = platform.open_window(&["a"]);
    let (w2, _) = platform.open_window(&["b"]);

    let res = handle_command(&coordinator, &json!({"task": "removeWindows", "windowIds": [w1]}))
        .await
        .unwrap();

    let windows = res["windows"].as_array().unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0]["id"], w2);
}

#[tokio::test]
async fn test_pin_tabs() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b"]);

    let res = handle_command(&coordinator, &json!({"task": "pinTabs", "tabIds": [tabs[1]]}))
        .await
        .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[1], tabs[0]]);
    assert_eq!(res["windows"][0]["tabs"][0]["pinned"], true);
}

#[tokio::test]
async fn test_sort_tabs() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["b", "a", "c"]);

    let res = handle_command(&coordinator, &json!({"task": "sortTabs", "tabIds": tabs.clone()}))
        .await
        .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[1], tabs[0], tabs[2]]);
}

#[tokio::test]
async fn test_move_tabs_to_end_with_minus_one() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b", "c"]);

    let res = handle_command(
        &coordinator,
        &json!({"task": "moveTabs", "tabIds": [tabs[0]], "windowId": window_id, "index": -1}),
    )
    .await
    .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[1], tabs[2], tabs[0]]);
}

#[tokio::test]
async fn test_move_tabs_to_index() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b", "c", "d"]);

    let res = handle_command(
        &coordinator,
        &json!({"task": "moveTabs", "tabIds": [tabs[3]], "windowId": window_id, "index": 1}),
    )
    .await
    .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[0], tabs[3], tabs[1], tabs[2]]);
}

#[tokio::test]
async fn test_extract_tabs() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b", "c"]);

    let res = handle_command(&coordinator, &json!({"task": "extractTabs", "tabIds": [tabs[1], tabs[2]]}))
        .await
        .unwrap();

    assert_eq!(res["windows"].as_array().unwrap().len(), 2);
    assert_eq!(tab_ids(&res, window_id), vec![tabs[0]]);
}

#[tokio::test]
async fn test_remove_duplicates() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["x", "y", "x"]);

    let res = handle_command(&coordinator, &json!({"task": "removeDuplicates", "tabIds": tabs.clone()}))
        .await
        .unwrap();

    assert_eq!(tab_ids(&res, window_id), vec![tabs[0], tabs[1]]);
}

// ─── Fire and forget ───

#[tokio::test]
async fn test_focus_and_create_commands_reply_ok() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b"]);

    for request in [
        json!({"task": "focusTab", "tabId": tabs[1]}),
        json!({"task": "focusTab", "tabId": tabs[0], "windowId": window_id}),
        json!({"task": "focusWindow", "windowId": window_id}),
        json!({"task": "createTab", "windowId": window_id}),
        json!({"task": "openUrl", "url": "https://example.org"}),
        // Last, since the new window takes focus.
        json!({"task": "createWindow"}),
    ] {
        let res = handle_command(&coordinator, &request).await;
        assert_eq!(res, Ok(json!({"ok": true})), "request {}", request);
    }
    assert_eq!(platform.window_ids().len(), 2);
    assert_eq!(platform.tab_order(window_id).len(), 4);
}

#[tokio::test]
async fn test_platform_error_is_reported() {
    let (_platform, coordinator) = setup();
    let res = handle_command(&coordinator, &json!({"task": "focusWindow", "windowId": 99})).await;
    assert_eq!(res, Err("No window with id: 99".to_string()));
}

// ─── Pushes ───

#[tokio::test]
async fn test_push_line_is_tagged_by_task() {
    let (platform, coordinator) = setup();
    let (window_id, tabs) = platform.open_window(&["a", "b"]);
    let windows = coordinator.snapshot().await.unwrap();

    let line = push_line(&PushEvent::NewTree { windows }).unwrap();

    assert_eq!(line["task"], "newTree");
    assert!(line.get("event").is_none());
    let listed = json!({"windows": line["windows"].clone()});
    assert_eq!(tab_ids(&listed, window_id), tabs);
}
