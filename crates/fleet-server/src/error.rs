use fleet_db::DbError;
use thiserror::Error;

/// Failures that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}
