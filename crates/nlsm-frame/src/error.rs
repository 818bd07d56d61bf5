/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A payload could not be interpreted as raw bytes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Strict decoding only: ESC was followed by a byte that is neither
    /// ESC_END nor ESC_ESC. Permissive decoding absorbs this instead.
    #[error("invalid escape sequence (ESC followed by {byte:#04x})")]
    InvalidEscape { byte: u8 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed before a frame could be fully written.
    #[error("link closed (incomplete write)")]
    LinkClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
