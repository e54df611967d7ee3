use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a failed remote call.
///
/// "Already exists" is not an error kind: create operations report it through
/// [`crate::services::Creation::AlreadyExists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    NotFound,
    /// The compute platform rejected the execution role because its trust
    /// relationship has not propagated yet.
    RoleNotAssumable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub operation: &'static str,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Other,
            operation,
            message: message.into(),
        }
    }

    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, message).with_kind(RemoteErrorKind::NotFound)
    }

    pub fn with_kind(mut self, kind: RemoteErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is(&self, kind: RemoteErrorKind) -> bool {
        self.kind == kind
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("source directory '{}' does not exist", .0.display())]
    MissingSourceDir(PathBuf),
    #[error("dependency resolution failed: {0}")]
    DependencyResolution(String),
    #[error("i/o error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fatal failure of a deployment stage. The run stops at the first one.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("table provisioning failed: {0}")]
    Table(#[source] RemoteError),
    #[error("role provisioning failed: {0}")]
    Role(#[source] RemoteError),
    #[error("artifact build failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("artifact delivery failed: {0}")]
    Delivery(#[source] RemoteError),
    #[error("function provisioning failed: {0}")]
    Function(#[source] RemoteError),
    #[error(
        "function '{function}' received new code but its configuration update failed; re-run deploy to converge: {source}"
    )]
    InconsistentUpdate {
        function: String,
        #[source]
        source: RemoteError,
    },
    #[error("gateway provisioning failed: {0}")]
    Gateway(#[source] RemoteError),
    #[error("{resource} did not become ready after {attempts} attempts")]
    NotReady { resource: String, attempts: u32 },
}

pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_names_operation() {
        let error = RemoteError::new("CreateTable", "AccessDenied: not authorized");
        assert_eq!(
            error.to_string(),
            "CreateTable failed: AccessDenied: not authorized"
        );
        assert!(error.is(RemoteErrorKind::Other));
    }

    #[test]
    fn inconsistent_update_mentions_rerun() {
        let error = DeployError::InconsistentUpdate {
            function: "EventsApiFunction".to_string(),
            source: RemoteError::new("UpdateFunctionConfiguration", "throttled"),
        };
        let message = error.to_string();
        assert!(message.contains("EventsApiFunction"));
        assert!(message.contains("re-run deploy"));
    }
}
