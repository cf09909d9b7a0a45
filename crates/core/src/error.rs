use crate::scene::NodeId;

/// Result alias that carries the custom [`SketchError`] type.
pub type Result<T> = std::result::Result<T, SketchError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    /// Free-form failure that does not warrant its own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Encoding the captured narration to disk failed.
    #[error("audio export failed: {0}")]
    Wav(#[from] hound::Error),
    /// A configuration or trace document could not be parsed.
    #[error("invalid document: {0}")]
    Config(#[from] serde_json::Error),
    /// `start` was called while the recorder was already capturing.
    #[error("a recording is already in progress")]
    AlreadyRecording,
    /// Export was requested before any sample was captured.
    #[error("no audio has been captured")]
    EmptyCapture,
    /// The handle refers to a node that was removed or never existed.
    #[error("node {0:?} does not exist in the scene")]
    MissingNode(NodeId),
    /// Reparenting would detach the root or create a cycle.
    #[error("cannot move node {child:?} under {parent:?}")]
    InvalidReparent { child: NodeId, parent: NodeId },
}

impl SketchError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for SketchError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SketchError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
