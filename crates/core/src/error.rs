/// Result alias that carries the custom [`PldError`] type.
pub type Result<T> = std::result::Result<T, PldError>;

/// Common error type for the core crate.
///
/// Every variant except [`PldError::Analysis`] is raised while an animation
/// is being constructed. Once an [`Animation`](crate::Animation) exists,
/// ticking and reading poses cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum PldError {
    /// The requested action name is not part of the action library.
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    /// A body profile attribute could not be recognised.
    #[error("invalid body profile: {0}")]
    InvalidProfile(String),
    /// A limb segment has zero (or otherwise unusable) length, so its
    /// direction cannot be derived from an angle.
    #[error("degenerate kinematic chain: segment `{segment}` has length {length}")]
    DegenerateChain { segment: &'static str, length: f32 },
    /// Playback options that cannot drive a clock.
    #[error("invalid animation options: {0}")]
    InvalidOptions(String),
    /// A keyframe list that violates the timing contract.
    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(&'static str),
    /// The spectral transform rejected its buffers.
    #[error("motion analysis failed: {0}")]
    Analysis(#[from] realfft::FftError),
    /// Malformed JSON configuration.
    #[error("{0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl PldError {
    /// Creates an [`PldError::InvalidOptions`] from any message.
    pub fn options<T: Into<String>>(msg: T) -> Self {
        Self::InvalidOptions(msg.into())
    }

    /// Creates an [`PldError::InvalidProfile`] from any message.
    pub fn profile<T: Into<String>>(msg: T) -> Self {
        Self::InvalidProfile(msg.into())
    }
}
