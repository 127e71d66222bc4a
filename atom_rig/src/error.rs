//! Error types for atom_rig

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialise error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The rig has no clip for an entry of the gesture table.  Raised once,
    /// at startup.
    #[error("rig has no clip named \"{0}\"")]
    MissingClip(String),

    /// A manual override named a clip outside the gesture table.
    #[error("unknown clip \"{0}\"")]
    UnknownClip(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("hand detector: {0}")]
    Detector(String),

    #[error("detector reply: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad landmarks: {0}")]
    Landmark(#[from] hand_gesture::LandmarkError),

    #[error("window: {0}")]
    Window(String),

    #[error("camera support not compiled in (rebuild with --features camera)")]
    CameraUnavailable,

    #[cfg(feature = "camera")]
    #[error("OpenCV: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl From<minifb::Error> for Error {
    fn from(e: minifb::Error) -> Self {
        Error::Window(e.to_string())
    }
}
