use docmodel_core::Error as ModelError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Malformed model file: {message}")]
    MalformedModel { message: String },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedModel {
            message: message.into(),
        }
    }
}

impl From<Error> for ModelError {
    fn from(error: Error) -> Self {
        match error {
            Error::Model(inner) => inner,
            other => ModelError::invalid(other.to_string()),
        }
    }
}
