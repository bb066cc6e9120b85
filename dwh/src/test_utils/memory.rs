use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::WarehouseClient;
use crate::dwh_error;
use crate::error::{DwhResult, ErrorKind};

#[derive(Debug, Default)]
struct Inner {
    executed: Vec<String>,
    closed: bool,
}

/// In-memory [`WarehouseClient`] that records every statement it receives.
///
/// Clones share the same record, so a test can keep one handle while the runner owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouseClient {
    inner: Arc<Mutex<Inner>>,
    failures: Arc<Vec<(String, ErrorKind)>>,
}

impl MemoryWarehouseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement containing `pattern` fail with `kind`, after it has been recorded.
    pub fn fail_when_contains(mut self, pattern: &str, kind: ErrorKind) -> Self {
        Arc::make_mut(&mut self.failures).push((pattern.to_string(), kind));
        self
    }

    /// Returns the statements executed so far, including transaction control.
    pub async fn executed(&self) -> Vec<String> {
        self.inner.lock().await.executed.clone()
    }

    /// Returns the executed statements without `BEGIN`, `COMMIT` and `ROLLBACK`.
    pub async fn executed_statements(&self) -> Vec<String> {
        self.executed()
            .await
            .into_iter()
            .filter(|sql| !matches!(sql.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK"))
            .collect()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl WarehouseClient for MemoryWarehouseClient {
    async fn execute(&self, sql: &str) -> DwhResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(dwh_error!(
                ErrorKind::WarehouseConnectionFailed,
                "Warehouse connection is closed"
            ));
        }

        inner.executed.push(sql.to_string());

        if let Some((pattern, kind)) = self
            .failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            return Err(dwh_error!(
                *kind,
                "Injected statement failure",
                format!("statement matched `{pattern}`")
            ));
        }

        Ok(())
    }

    async fn close(self) -> DwhResult<()> {
        self.inner.lock().await.closed = true;

        Ok(())
    }
}
