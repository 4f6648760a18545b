//! Error taxonomy for inbox operations.

use thiserror::Error as TError;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Error that ends an inbox subscription, either during construction or
/// from inside the delivery loop.
#[derive(TError, Debug)]
pub enum Error {
    /// HTTP request failure during session bootstrap or message fetch.
    #[error("http transport error: {0}")]
    Http(reqwest::Error),

    /// Websocket handshake or stream failure.
    #[error("websocket transport error: {0}")]
    Socket(WsError),

    /// The bootstrap response carried no session cookie.
    #[error("no session cookie in bootstrap response")]
    MissingSessionCookie,

    /// A notification frame that was not valid JSON.
    #[error("malformed notification frame: {0}")]
    MalformedFrame(serde_json::Error),

    /// A fetched message body that did not decode.
    #[error("malformed message body: {0}")]
    Decode(serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<WsError> for Error {
    fn from(err: WsError) -> Self {
        Self::Socket(err)
    }
}

/// Result type for all inbox operations.
pub type Result<T> = std::result::Result<T, Error>;
