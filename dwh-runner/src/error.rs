use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use dwh::error::DwhError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for the binaries.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Captured backtrace for variants whose source does not carry one.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned by a run of either binary.
#[derive(Debug)]
pub enum RunnerError {
    /// Failure while provisioning or loading the warehouse.
    Dwh(DwhError),
    /// Configuration could not be loaded, validated or applied.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The runtime could not be started.
    Io(std::io::Error, CapturedBacktrace),
}

impl RunnerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            RunnerError::Dwh(_) => "warehouse error",
            RunnerError::Config(_, _) => "configuration error",
            RunnerError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            RunnerError::Dwh(err) => err.backtrace(),
            RunnerError::Config(_, backtrace) => Some(&backtrace.0),
            RunnerError::Io(_, backtrace) => Some(&backtrace.0),
        }
    }

    /// Creates a configuration error from any error type.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns the report printed to stderr when `app_name` fails.
    pub fn render_report(&self, app_name: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{app_name} failed\n"));
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        // Aggregated errors already list every member in their message.
        if !matches!(self, RunnerError::Dwh(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Dwh(err) => write!(f, "{err}"),
            RunnerError::Config(source, _) => write!(f, "configuration error: {source}"),
            RunnerError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::Dwh(err) => err.source(),
            RunnerError::Config(source, _) => Some(source.as_ref()),
            RunnerError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<DwhError> for RunnerError {
    fn from(err: DwhError) -> Self {
        RunnerError::Dwh(err)
    }
}

#[cfg(test)]
mod tests {
    use dwh::dwh_error;
    use dwh::error::ErrorKind;

    use super::*;

    #[test]
    fn report_lists_category_and_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "dwh.cfg");
        let err = RunnerError::config(io);

        let report = err.render_report("etl");

        assert!(report.starts_with("etl failed\ncategory: configuration error\n"));
        assert!(report.contains("error: configuration error: dwh.cfg\n"));
        assert!(report.contains("cause 1: dwh.cfg\n"));
    }

    #[test]
    fn warehouse_errors_keep_their_kind() {
        let err = RunnerError::from(dwh_error!(
            ErrorKind::AuthenticationError,
            "Warehouse authentication failed",
            "28P01: password authentication failed"
        ));

        assert_eq!(err.category(), "warehouse error");
        assert!(matches!(&err, RunnerError::Dwh(inner) if inner.kind() == ErrorKind::AuthenticationError));
        assert!(err.render_report("create-tables").contains("[AuthenticationError]"));
    }
}
