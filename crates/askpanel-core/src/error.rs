/// Why a send did not produce an answer.
///
/// Every variant settles the same way (fallback message plus banner); the
/// variant only shows up in logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The request never got an HTTP response.
    #[error("request failed: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The body was not JSON with a string `answer` field.
    #[error("response could not be decoded: {0}")]
    Decode(String),

    /// The task running the request went away before settling.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SendError::Decode(err.to_string())
        } else {
            SendError::Network(err.to_string())
        }
    }
}
