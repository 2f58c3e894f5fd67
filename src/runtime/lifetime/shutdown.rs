use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use crate::reconciler::ExpiryReconciler;

/// 等待 Ctrl+C，然后通知清扫任务停止（不等待正在进行的清扫）
pub async fn listen_for_shutdown(reconciler: Option<Arc<ExpiryReconciler>>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    if let Some(reconciler) = reconciler {
        reconciler.stop();
    }
}
