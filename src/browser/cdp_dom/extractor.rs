use std::time::Duration;

use anyhow::{anyhow, Result};
use chromiumoxide::cdp::browser_protocol::dom::{GetDocumentParams, GetDocumentReturns};
use chromiumoxide::cdp::browser_protocol::dom_snapshot::{CaptureSnapshotParams, CaptureSnapshotReturns};
use chromiumoxide::Page;
use tokio::time::timeout;

use super::types::{RawCdpTrees, SNAPSHOT_STYLES};

pub const CDP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch the DOM tree and layout snapshot in parallel. The snapshot is
/// optional; without it the document has no layout information.
pub async fn extract_trees(page: &Page) -> Result<RawCdpTrees> {
    let (dom_result, snapshot_result) = tokio::join!(get_dom_tree(page), get_dom_snapshot(page));

    let dom = dom_result?;
    let snapshot = match snapshot_result {
        Ok(snapshot) => Some(serde_json::to_value(&snapshot)?),
        Err(e) => {
            tracing::warn!("Layout snapshot unavailable: {}", e);
            None
        }
    };
    let url = page.url().await.ok().flatten();

    Ok(RawCdpTrees { dom_root: serde_json::to_value(&dom.root)?, snapshot, url })
}

/// Full DOM tree, piercing shadow roots and iframes
async fn get_dom_tree(page: &Page) -> Result<GetDocumentReturns> {
    let params = GetDocumentParams { depth: Some(-1), pierce: Some(true) };

    let result = timeout(CDP_TIMEOUT, page.execute(params))
        .await
        .map_err(|_| anyhow!("DOM.getDocument timeout"))?
        .map_err(|e| anyhow!("DOM.getDocument failed: {}", e))?;

    Ok(result.result)
}

async fn get_dom_snapshot(page: &Page) -> Result<CaptureSnapshotReturns> {
    let params = CaptureSnapshotParams {
        computed_styles: SNAPSHOT_STYLES.iter().map(|s| s.to_string()).collect(),
        include_paint_order: None,
        include_dom_rects: Some(true),
        include_blended_background_colors: None,
        include_text_color_opacities: None,
    };

    let result = timeout(CDP_TIMEOUT, page.execute(params))
        .await
        .map_err(|_| anyhow!("DOMSnapshot.captureSnapshot timeout"))?
        .map_err(|e| anyhow!("DOMSnapshot.captureSnapshot failed: {}", e))?;

    Ok(result.result)
}
