//! Typed errors for the FAT volume, converted to [`pennos_abi::ErrorCode`] at
//! the syscall boundary (`pennos_core::syscall::fs`).

use pennos_abi::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("file already exists: {0}")]
    AlreadyExists(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("file descriptor table is full")]
    FdTableFull,
    #[error("invalid file descriptor: {0}")]
    BadFd(i32),
    #[error("file is already open in a conflicting mode")]
    ConflictingOpen,
    #[error("the FAT volume is full")]
    VolumeFull,
    #[error("the root directory is full")]
    DirectoryFull,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NoSuchFile,
            Self::AlreadyExists(_) => ErrorCode::InvalidArg,
            Self::PermissionDenied(_) => ErrorCode::PermError,
            Self::FdTableFull | Self::BadFd(_) => ErrorCode::FdError,
            Self::ConflictingOpen => ErrorCode::PermError,
            Self::VolumeFull | Self::DirectoryFull => ErrorCode::IoError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArg,
            Self::Io(_) => ErrorCode::HostError,
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
