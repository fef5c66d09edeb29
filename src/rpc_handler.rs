//! Command handler for the TidyTabs messaging gateway.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! [`handle_command`] parses a `task`-tagged request and dispatches it to the
//! [`Coordinator`]. Commands that wait for their effect reply with a fresh
//! [`Response`]; fire-and-forget commands reply with `{"ok": true}`.

use serde_json::{json, Value};

use crate::app::Coordinator;
use crate::platform::TabPlatform;
use crate::types::errors::CoordinatorError;
use crate::types::message::{Command, PushEvent, Response};
use crate::types::tab::MoveTarget;

/// Parses and runs one request.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
/// Fields the command does not use (such as the gateway's `id`) are ignored.
pub async fn handle_command<P: TabPlatform>(
    coordinator: &Coordinator<P>,
    request: &Value,
) -> Result<Value, String> {
    let command: Command = serde_json::from_value(request.clone())
        .map_err(|e| CoordinatorError::Protocol(e.to_string()).to_string())?;
    match dispatch(coordinator, command).await.map_err(|e| e.to_string())? {
        Some(response) => serde_json::to_value(response).map_err(|e| e.to_string()),
        None => Ok(json!({"ok": true})),
    }
}

/// Wire form of an unsolicited push, tagged by `task` like the commands.
pub fn push_line(event: &PushEvent) -> Result<Value, String> {
    serde_json::to_value(event).map_err(|e| e.to_string())
}

/// Runs a parsed command. `None` means the command has no tree to reply with.
pub async fn dispatch<P: TabPlatform>(
    coordinator: &Coordinator<P>,
    command: Command,
) -> Result<Option<Response>, CoordinatorError> {
    let failures = match command {
        // ─── Handshake ───
        Command::Init => return coordinator.init().await.map(Some),
        Command::PopupInactive => {
            coordinator.popup_inactive();
            return Ok(None);
        }

        // ─── Fire and forget ───
        Command::CreateTab { window_id } => {
            coordinator.create_tab(window_id).await?;
            return Ok(None);
        }
        Command::CreateWindow => {
            coordinator.create_window().await?;
            return Ok(None);
        }
        Command::FocusTab { tab_id, window_id } => {
            coordinator.focus_tab(tab_id, window_id).await?;
            return Ok(None);
        }
        Command::FocusWindow { window_id } => {
            coordinator.focus_window(window_id).await?;
            return Ok(None);
        }
        Command::OpenUrl { url } => {
            coordinator.open_url(&url).await?;
            return Ok(None);
        }
        Command::StoreString { name, string } => {
            coordinator.store_string(&name, &string)?;
            return Ok(None);
        }

        // ─── Batches ───
        Command::RemoveTabs { tab_ids } => coordinator.remove_tabs(&tab_ids).await,
        Command::RemoveWindows { window_ids } => coordinator.remove_windows(&window_ids).await,
        Command::ExtractTabs { tab_ids } => coordinator.extract_tabs(&tab_ids).await,
        Command::PinTabs { tab_ids } => coordinator.pin_tabs(&tab_ids).await,
        Command::SortTabs { tab_ids } => coordinator.sort_tabs(&tab_ids).await,
        Command::RemoveDuplicates { tab_ids } => coordinator.remove_duplicates(&tab_ids).await,
        Command::MoveTabs { tab_ids, window_id, index } => {
            coordinator
                .move_tabs(&tab_ids, MoveTarget { window_id, index })
                .await?
        }
    };
    coordinator.tree_response(failures).await.map(Some)
}
