//! Error types and result definitions for warehouse job operations.
//!
//! [`DwhError`] carries a classification ([`ErrorKind`]), a static description, optional dynamic
//! detail, the originating error and the callsite where it was raised. Several errors can be
//! aggregated into one, which is how a failed rollback is reported next to the statement failure
//! that triggered it.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use dwh_postgres::tls::TlsSetupError;

/// Convenient result type for warehouse operations using [`DwhError`] as the error type.
pub type DwhResult<T> = Result<T, DwhError>;

/// Detailed payload stored for single [`DwhError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for warehouse operations.
#[derive(Debug, Clone)]
pub struct DwhError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    Many {
        errors: Vec<DwhError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors raised while provisioning or loading the warehouse.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection Errors
    WarehouseConnectionFailed,
    AuthenticationError,
    TlsError,

    // Statement Errors
    QueryFailed,
    SyntaxError,
    SchemaError,
    ConstraintViolation,
    ConversionError,
    PermissionDenied,
    QueryCanceled,
    ResourceExhausted,

    // Catalog Errors
    CatalogDependencyCycle,
    CatalogUnknownTable,

    // Configuration Errors
    ConfigError,

    // State Errors
    InvalidState,
    TransactionStateError,

    // General Errors
    WarehouseError,
    Unknown,
}

impl DwhError {
    /// Returns the [`ErrorKind`] of this error, or of the first aggregated error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every [`ErrorKind`] contained in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors.iter().flat_map(|err| err.kinds()).collect(),
        }
    }

    /// Returns the static description of this error, or of the first aggregated error.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => &payload.description,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.description())
                .unwrap_or("no errors"),
        }
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, or `None` for a single error.
    pub fn errors(&self) -> Option<&[DwhError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the callsite where this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error. Has no effect on aggregated errors.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        DwhError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for DwhError {
    fn eq(&self, other: &DwhError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DwhError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    for line in detail.lines() {
                        write!(f, "\n    {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for DwhError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`DwhError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for DwhError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> DwhError {
        DwhError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`DwhError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for DwhError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> DwhError {
        DwhError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates several errors. A single error is returned as is.
impl<E> From<Vec<E>> for DwhError
where
    E: Into<DwhError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> DwhError {
        let location = Location::caller();
        let mut errors: Vec<DwhError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        DwhError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

impl From<TlsSetupError> for DwhError {
    #[track_caller]
    fn from(err: TlsSetupError) -> DwhError {
        let detail = err.to_string();
        DwhError::from_components(
            ErrorKind::TlsError,
            Cow::Borrowed("TLS setup failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`tokio_postgres::Error`] to [`DwhError`], classifying by SQLSTATE.
///
/// Errors without a SQLSTATE never reached the server and are treated as connection failures.
impl From<tokio_postgres::Error> for DwhError {
    #[track_caller]
    fn from(err: tokio_postgres::Error) -> DwhError {
        let (kind, description) = match err.code() {
            Some(sqlstate) => classify_sqlstate(sqlstate.code()),
            None => (
                ErrorKind::WarehouseConnectionFailed,
                "Warehouse connection failed",
            ),
        };

        let detail = match err.as_db_error() {
            Some(db_error) => format!("{}: {}", db_error.code().code(), db_error.message()),
            None => err.to_string(),
        };

        DwhError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Maps a SQLSTATE code to an [`ErrorKind`] and a static description.
fn classify_sqlstate(code: &str) -> (ErrorKind, &'static str) {
    match code {
        "42601" => (ErrorKind::SyntaxError, "Statement has a syntax error"),
        "42501" => (ErrorKind::PermissionDenied, "Insufficient privilege"),
        "42P01" | "42703" | "3F000" | "42P07" => (
            ErrorKind::SchemaError,
            "Statement references an invalid schema object",
        ),
        "57014" => (ErrorKind::QueryCanceled, "Statement was canceled"),
        _ => match code.get(..2) {
            Some("08") => (
                ErrorKind::WarehouseConnectionFailed,
                "Warehouse connection failed",
            ),
            Some("28") => (
                ErrorKind::AuthenticationError,
                "Warehouse authentication failed",
            ),
            Some("23") => (ErrorKind::ConstraintViolation, "Constraint violation"),
            Some("22") => (ErrorKind::ConversionError, "Data conversion failed"),
            Some("25") | Some("40") => (
                ErrorKind::TransactionStateError,
                "Transaction state error",
            ),
            Some("42") => (ErrorKind::QueryFailed, "Statement failed"),
            Some("53") | Some("54") => (
                ErrorKind::ResourceExhausted,
                "Warehouse resources exhausted",
            ),
            _ => (ErrorKind::WarehouseError, "Warehouse error"),
        },
    }
}
