//! Error taxonomy shared by every subsystem.
//!
//! Each component returns a tagged [`BridgeError`]. The supervisor adds a
//! stage prefix with [`BridgeError::context`] and never retries; the first
//! error that reaches it terminates the process.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced while translating, extracting, watching or supervising.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A document could not be read from disk.
    #[error("read {what} ({}): {source}", path.display())]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document was read but is not valid for its schema.
    #[error("unmarshal {what} ({}): {source}", path.display())]
    Unmarshal {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An SDS document carries no resources.
    #[error("resources section not found in {}", path.display())]
    MissingResource { path: PathBuf },

    /// Legacy single-binding mode: a cluster has no listener.
    #[error("port is missing for cluster name {cluster}")]
    MissingListener { cluster: String },

    /// Legacy single-binding mode: a cluster has more than one listener.
    #[error("cluster {cluster} is bound by {count} listeners, expected exactly one")]
    AmbiguousListener { cluster: String, count: usize },

    /// A listener routes to a cluster the document does not define.
    #[error("listener on port {port} references unknown cluster {cluster}")]
    UnknownCluster { cluster: String, port: u16 },

    /// A cluster has no upstream endpoint to render.
    #[error("cluster {cluster} has no upstream endpoint")]
    MissingEndpoint { cluster: String },

    /// A port value is missing or out of range.
    #[error("invalid port {value:?} in {location}")]
    InvalidPort { value: String, location: String },

    /// An output file could not be written.
    #[error("write {what} ({}): {source}", path.display())]
    Write {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The nginx child failed to launch or to reload.
    #[error("{action}: {source}")]
    ChildProcess {
        action: ChildAction,
        #[source]
        source: CommandError,
    },

    /// The file watch backend failed.
    #[error("watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The file watch backend stopped delivering events.
    #[error("watch {}: event stream closed", path.display())]
    WatchClosed { path: PathBuf },

    /// The nginx error log could not be tailed.
    #[error("{}: {source}", path.display())]
    Tail {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bridge's own settings are invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A supervised task panicked or was cancelled.
    #[error("supervised task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Another error annotated with the stage that produced it.
    #[error("{stage}: {source}")]
    Context {
        stage: &'static str,
        #[source]
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    /// Prefix this error with the failing stage, e.g. `write tls files`.
    pub fn context(self, stage: &'static str) -> Self {
        BridgeError::Context {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any stage prefixes.
    pub fn root_cause(&self) -> &BridgeError {
        let mut current = self;
        while let BridgeError::Context { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Which child-process invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAction {
    Launch,
    Reload,
}

impl fmt::Display for ChildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildAction::Launch => write!(f, "cmd run"),
            ChildAction::Reload => write!(f, "reload nginx"),
        }
    }
}

/// Failure of a single external command invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}")]
    Exit { binary: String, status: ExitStatus },

    /// Raised by non-process runners (tests, dry runs).
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_stage() {
        let err = BridgeError::MissingResource {
            path: PathBuf::from("sds.yaml"),
        }
        .context("write tls files");

        assert_eq!(
            err.to_string(),
            "write tls files: resources section not found in sds.yaml"
        );
        assert!(matches!(
            err.root_cause(),
            BridgeError::MissingResource { .. }
        ));
    }

    #[test]
    fn test_child_process_message() {
        let err = BridgeError::ChildProcess {
            action: ChildAction::Launch,
            source: CommandError::Other("banana".into()),
        };
        assert_eq!(err.to_string(), "cmd run: banana");
    }
}
