use std::fmt;
use std::future::Future;
use std::mem;
use std::time::{Duration, Instant};

use dwh_config::shared::CommitMode;
use tracing::{debug, info, warn};

use crate::bail;
use crate::catalog::Statement;
use crate::client::WarehouseClient;
use crate::error::{DwhError, DwhResult, ErrorKind};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => f.write_str("disconnected"),
            SessionState::Connected => f.write_str("connected"),
            SessionState::Closed => f.write_str("closed"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub statements_executed: usize,
    pub elapsed: Duration,
}

enum Connection<C> {
    Disconnected,
    Connected { client: C, transaction_open: bool },
    Closed,
}

/// A single warehouse connection executing statements strictly one after another.
///
/// In [`CommitMode::PerStatement`] every statement is wrapped in its own transaction. In
/// [`CommitMode::SingleTransaction`] the first statement opens a transaction that is committed by
/// [`Session::close`] and rolled back on the first failure.
pub struct Session<C> {
    connection: Connection<C>,
    commit_mode: CommitMode,
    statements_executed: usize,
    started_at: Option<Instant>,
}

impl<C> Session<C>
where
    C: WarehouseClient,
{
    pub fn new(commit_mode: CommitMode) -> Session<C> {
        Session {
            connection: Connection::Disconnected,
            commit_mode,
            statements_executed: 0,
            started_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.connection {
            Connection::Disconnected => SessionState::Disconnected,
            Connection::Connected { .. } => SessionState::Connected,
            Connection::Closed => SessionState::Closed,
        }
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Connects using `connect`. On failure the session stays disconnected.
    pub async fn connect<F, Fut>(&mut self, connect: F) -> DwhResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DwhResult<C>>,
    {
        if self.state() != SessionState::Disconnected {
            bail!(
                ErrorKind::InvalidState,
                "Session can only connect once",
                format!("session is {}", self.state())
            );
        }

        let client = connect().await?;
        self.connection = Connection::Connected {
            client,
            transaction_open: false,
        };
        self.started_at = Some(Instant::now());

        info!(commit_mode = %self.commit_mode, "session connected");

        Ok(())
    }

    /// Executes `statements` in order, stopping at the first failure.
    pub async fn execute_all(&mut self, statements: &[Statement]) -> DwhResult<()> {
        for statement in statements {
            self.execute(statement).await?;
        }

        Ok(())
    }

    /// Executes a single statement and returns how long it took.
    ///
    /// A failed statement rolls back its transaction. If the rollback fails too, both errors are
    /// returned together.
    pub async fn execute(&mut self, statement: &Statement) -> DwhResult<Duration> {
        let commit_mode = self.commit_mode;
        let state = self.state();
        let Connection::Connected {
            client,
            transaction_open,
        } = &mut self.connection
        else {
            bail!(
                ErrorKind::InvalidState,
                "Statements can only run on a connected session",
                format!("session is {state}")
            );
        };

        let start = Instant::now();

        if !*transaction_open {
            client.begin().await?;
            *transaction_open = true;
        }

        debug!(
            phase = %statement.kind(),
            table = %statement.table(),
            sql = statement.sql(),
            "executing statement"
        );

        if let Err(err) = client.execute(statement.sql()).await {
            *transaction_open = false;
            return Err(with_rollback(client, err).await);
        }

        if commit_mode == CommitMode::PerStatement {
            *transaction_open = false;
            client.commit().await?;
        }

        let elapsed = start.elapsed();
        self.statements_executed += 1;

        info!(
            phase = %statement.kind(),
            table = %statement.table(),
            elapsed_ms = elapsed.as_millis() as u64,
            "statement executed"
        );

        Ok(elapsed)
    }

    /// Commits any open transaction and closes the connection.
    pub async fn close(&mut self) -> DwhResult<RunSummary> {
        let state = self.state();
        let (client, transaction_open) =
            match mem::replace(&mut self.connection, Connection::Closed) {
                Connection::Connected {
                    client,
                    transaction_open,
                } => (client, transaction_open),
                other => {
                    self.connection = other;
                    bail!(
                        ErrorKind::InvalidState,
                        "Only a connected session can be closed",
                        format!("session is {state}")
                    );
                }
            };

        if transaction_open && let Err(err) = client.commit().await {
            return Err(with_rollback(&client, err).await);
        }

        client.close().await?;

        let summary = RunSummary {
            statements_executed: self.statements_executed,
            elapsed: self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
        };

        info!(
            statements_executed = summary.statements_executed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "session closed"
        );

        Ok(summary)
    }

    /// Closes the session after a failed run without committing anything.
    ///
    /// Failures while closing are logged and otherwise ignored so `err` is what the caller sees.
    pub async fn abort(&mut self, err: DwhError) -> DwhError {
        match mem::replace(&mut self.connection, Connection::Closed) {
            Connection::Connected {
                client,
                transaction_open,
            } => {
                if transaction_open && let Err(rollback_err) = client.rollback().await {
                    warn!(error = %rollback_err, "rollback after a failed run failed");
                }
                if let Err(close_err) = client.close().await {
                    warn!(error = %close_err, "closing the session after a failed run failed");
                }
            }
            // Nothing was opened.
            other => self.connection = other,
        }

        warn!(
            statements_executed = self.statements_executed,
            "run aborted"
        );

        err
    }

    /// Closes the session if `result` is a success and aborts it otherwise.
    pub async fn finish(&mut self, result: DwhResult<()>) -> DwhResult<RunSummary> {
        match result {
            Ok(()) => self.close().await,
            Err(err) => Err(self.abort(err).await),
        }
    }
}

/// Rolls back after `err` and returns the error to report.
async fn with_rollback<C: WarehouseClient>(client: &C, err: DwhError) -> DwhError {
    match client.rollback().await {
        Ok(()) => err,
        Err(rollback_err) => DwhError::from(vec![err, rollback_err]),
    }
}
