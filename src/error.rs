use std::fmt;

pub type Result<T> = std::result::Result<T, ToolError>;

// Filesystem errors are sticky; retrying the same read or write within a run
// is not going to help.
impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> ToolError {
        ToolError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

// JSON serialization errors only happen when writing graph dumps.
impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> ToolError {
        ToolError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::RenderLayer,
            message: err.to_string(),
        })
    }
}

/// Express which stage of the pipeline an error came out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLayer {
    /// The caller handed us something unusable, like a file that is not a
    /// UCFB container or a level scheduled after loading already started.
    BadInput,
    /// The level data itself is broken: truncated chunks, sizes that run past
    /// their parent, unreadable files.
    DataLayer,
    /// Our own machinery failed, for example a loader job panicked.
    ServerLayer,
    /// Graphviz (or the graph dump writer) failed to produce an output file.
    RenderLayer,
}

/// Payload to provide details about what went wrong for investigation
/// purposes.
#[derive(Debug)]
pub struct ErrorDetails {
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

/// Sticky problems belong to the input; transient ones to the environment.
#[derive(Debug)]
pub enum ToolError {
    /// An error that will persist for this input, e.g. a truncated chunk.
    StickyProblem(ErrorDetails),
    /// An error that might go away if retried later, e.g. a Graphviz process
    /// that could not be spawned.
    TransientProblem(ErrorDetails),
}

impl ToolError {
    pub fn sticky(layer: ErrorLayer, message: impl Into<String>) -> Self {
        ToolError::StickyProblem(ErrorDetails {
            layer,
            message: message.into(),
        })
    }

    pub fn transient(layer: ErrorLayer, message: impl Into<String>) -> Self {
        ToolError::TransientProblem(ErrorDetails {
            layer,
            message: message.into(),
        })
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            ToolError::StickyProblem(d) | ToolError::TransientProblem(d) => d,
        }
    }

    pub fn layer(&self) -> ErrorLayer {
        self.details().layer
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self.details();
        write!(f, "{:?}: {}", details.layer, details.message)
    }
}

impl std::error::Error for ToolError {}
