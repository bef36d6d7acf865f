use thiserror::Error;

/// Failures talking to the SOS backend (token, media, location, ping).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("token service returned an empty credential")]
    EmptyCredential,

    #[error("could not read photo {path}: {source}")]
    PhotoRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a supported image")]
    UnsupportedImage(String),
}

/// Failures establishing the realtime room connection.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("invalid room url: {0}")]
    InvalidUrl(String),

    #[error("room connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}
