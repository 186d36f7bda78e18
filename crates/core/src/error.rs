use oss_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage error: {0}")]
    Files(#[from] FilesError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
