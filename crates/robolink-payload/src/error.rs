/// Errors that can occur while encoding or decoding a payload body.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The frame body carried no bytes at all, not even a kind tag.
    #[error("empty payload body")]
    Empty,

    /// The kind tag is not one this build understands.
    #[error("unknown payload tag 0x{0:02x}")]
    UnknownTag(u8),

    /// A telemetry field holds NaN or an infinity, which JSON cannot carry.
    #[error("telemetry field {field} is not finite")]
    NonFinite { field: &'static str },

    /// A structured record failed to serialize or parse.
    #[error("payload json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PayloadError>;
