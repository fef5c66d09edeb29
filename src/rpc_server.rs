//! TidyTabs RPC Server: the messaging gateway over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "task":"removeTabs", "tabIds":[3,4]}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"task":"newTree", "windows":[...]}
//!
//! Logs go to stderr so stdout only ever carries protocol lines.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use tidytabs::app::Coordinator;
use tidytabs::platform::{paths, MemoryPlatform};
use tidytabs::rpc_handler::{handle_command, push_line};
use tidytabs::services::preference_store::PreferenceStore;
use tidytabs::services::settings_engine::{load_config, CONFIG_FILE};

const SHUTDOWN_DRAIN: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = paths::get_data_dir();
    let config = match load_config(&data_dir.join(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config: {}", e);
            Default::default()
        }
    };
    let mut prefs = match PreferenceStore::open(&data_dir) {
        Ok(prefs) => prefs,
        Err(e) => {
            error!("Failed to open preferences in {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
    };
    if let Err(e) = prefs.check_version(env!("CARGO_PKG_VERSION")) {
        warn!("Install hook failed: {}", e);
    }

    let platform = Arc::new(MemoryPlatform::new());
    platform.open_window(&["about:newtab"]);
    let (coordinator, mut pushes) = Coordinator::new(platform, prefs, config);
    let coordinator = Arc::new(coordinator);
    coordinator.spawn_event_pump();

    // All stdout lines go through one writer so responses and pushes never interleave.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(line) = out_rx.recv().await {
            let mut bytes = line.to_string().into_bytes();
            bytes.push(b'\n');
            if stdout.write_all(&bytes).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let push_tx = out_tx.clone();
    tokio::spawn(async move {
        while let Some(push) = pushes.recv().await {
            match push_line(&push) {
                Ok(line) => {
                    let _ = push_tx.send(line);
                }
                Err(e) => warn!("Dropping push: {}", e),
            }
        }
    });

    let _ = out_tx.send(json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!("Gateway ready, data dir {}", data_dir.display());

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };
        let id = request.get("id").cloned().unwrap_or(Value::Null);

        // A removal waits for its confirmations; keep reading meanwhile.
        let coordinator = Arc::clone(&coordinator);
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            let response = match handle_command(&coordinator, &request).await {
                Ok(val) => json!({"id": id, "result": val}),
                Err(err) => json!({"id": id, "error": err}),
            };
            let _ = out_tx.send(response);
        });
    }

    info!("stdin closed, shutting down");
    coordinator.popup_inactive();
    drop(out_tx);
    // The push task keeps a sender alive, so give the writer a bounded drain.
    let _ = tokio::time::timeout(SHUTDOWN_DRAIN, writer).await;
}
