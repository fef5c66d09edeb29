//! Builds the window/tab tree the UI consumes.

use crate::platform::{TabPlatform, WindowQuery};
use crate::types::errors::PlatformError;
use crate::types::tab::Snapshot;

/// Queries every normal window with its tabs, in platform order.
pub async fn build_snapshot<P: TabPlatform>(platform: &P) -> Result<Snapshot, PlatformError> {
    let windows = platform
        .get_all_windows(WindowQuery::normal_populated())
        .await?;
    Ok(Snapshot::new(windows))
}
