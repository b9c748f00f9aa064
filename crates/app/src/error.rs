use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("client error: {0}")]
    Client(#[from] remote::BuildError),
    #[error("remote error: {0}")]
    Remote(#[from] engine::RemoteError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
