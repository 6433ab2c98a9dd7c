use std::{error::Error as StdError, fmt};

/// Connecting to a host failed (network or authentication).
#[derive(Debug)]
pub struct ConnectError {
    pub host: String,
    pub message: String,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot connect to `{}`: {}", self.host, self.message)
    }
}

impl StdError for ConnectError {}

/// A required privilege was missing on the connected account.
#[derive(Debug)]
pub struct PermissionError {
    pub schema: String,
    pub message: String,
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient privileges on schema `{}`: {}",
            self.schema, self.message
        )
    }
}

impl StdError for PermissionError {}

/// An `information_schema` query failed, or `SHOW CREATE` returned something
/// the introspector could not reconcile with `information_schema`.
#[derive(Debug)]
pub struct IntrospectionError {
    pub schema: String,
    pub table: Option<String>,
    pub message: String,
}

impl fmt::Display for IntrospectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(
                f,
                "introspection of `{}`.`{}` failed: {}",
                self.schema, table, self.message
            ),
            None => write!(f, "introspection of `{}` failed: {}", self.schema, self.message),
        }
    }
}

impl StdError for IntrospectionError {}

/// A specific table uses features the object model cannot faithfully
/// round-trip. Not fatal: the table is flagged `unsupported_for_diff` and
/// the run continues.
#[derive(Debug)]
pub struct UnsupportedFeatureError {
    pub table: String,
    pub reason: String,
}

impl fmt::Display for UnsupportedFeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table `{}` is unsupported for diff: {}",
            self.table, self.reason
        )
    }
}

impl StdError for UnsupportedFeatureError {}

/// A diff clause could not be rendered at all (as opposed to being
/// rendered-but-unsafe, which is represented on `RenderedStatement`).
#[derive(Debug)]
pub struct GenerateError {
    pub table: String,
    pub clause: String,
    pub message: String,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot render `{}` for table `{}`: {}",
            self.clause, self.table, self.message
        )
    }
}

impl StdError for GenerateError {}

/// The diff verifier replayed the generated ALTERs in a workspace and the
/// result did not match the expected target state. Fatal for the run.
#[derive(Debug)]
pub struct VerificationError {
    pub table: String,
    pub expected_create: String,
    pub actual_create: String,
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification failed for table `{}`:\n--- expected ---\n{}\n--- actual ---\n{}",
            self.table, self.expected_create, self.actual_create
        )
    }
}

impl StdError for VerificationError {}

#[derive(Debug)]
pub enum Error {
    Connect(ConnectError),
    Permission(PermissionError),
    Introspection(IntrospectionError),
    UnsupportedFeature(UnsupportedFeatureError),
    Generate(GenerateError),
    Verification(VerificationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(error) => write!(f, "connect error: {error}"),
            Self::Permission(error) => write!(f, "permission error: {error}"),
            Self::Introspection(error) => write!(f, "introspection error: {error}"),
            Self::UnsupportedFeature(error) => write!(f, "unsupported feature: {error}"),
            Self::Generate(error) => write!(f, "generate error: {error}"),
            Self::Verification(error) => write!(f, "verification error: {error}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connect(error) => Some(error),
            Self::Permission(error) => Some(error),
            Self::Introspection(error) => Some(error),
            Self::UnsupportedFeature(error) => Some(error),
            Self::Generate(error) => Some(error),
            Self::Verification(error) => Some(error),
        }
    }
}

impl From<ConnectError> for Error {
    fn from(value: ConnectError) -> Self {
        Self::Connect(value)
    }
}

impl From<PermissionError> for Error {
    fn from(value: PermissionError) -> Self {
        Self::Permission(value)
    }
}

impl From<IntrospectionError> for Error {
    fn from(value: IntrospectionError) -> Self {
        Self::Introspection(value)
    }
}

impl From<UnsupportedFeatureError> for Error {
    fn from(value: UnsupportedFeatureError) -> Self {
        Self::UnsupportedFeature(value)
    }
}

impl From<GenerateError> for Error {
    fn from(value: GenerateError) -> Self {
        Self::Generate(value)
    }
}

impl From<VerificationError> for Error {
    fn from(value: VerificationError) -> Self {
        Self::Verification(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
