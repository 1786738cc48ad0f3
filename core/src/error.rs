//! Typed kernel errors, converted to [`pennos_abi::ErrorCode`] at the
//! syscall boundary the same way `pennos_fs::FsError` is.

use pennos_abi::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("no such process: {0}")]
    NoSuchProcess(pennos_abi::Pid),
    #[error("no child processes")]
    NoChild,
    #[error("invalid signal")]
    InvalidSignal,
    #[error("invalid job id: {0}")]
    InvalidJob(pennos_abi::JobId),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Fs(#[from] pennos_fs::FsError),
}

impl KernelError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoSuchProcess(_) => ErrorCode::InvalidArg,
            Self::NoChild => ErrorCode::NoChild,
            Self::InvalidSignal => ErrorCode::InvalidSignal,
            Self::InvalidJob(_) => ErrorCode::InvalidJob,
            Self::InvalidArgument(_) => ErrorCode::InvalidArg,
            Self::Fs(err) => err.code(),
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
