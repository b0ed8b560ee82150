//! Unified error types for the ftpDeck core crate.
//!
//! Consumers (the desktop shell, command layers) map these to their own
//! transport representations; nothing below this crate's public surface
//! leaks a raw `suppaftp` or `std::io` error without classification.

use thiserror::Error;

/// Top-level error type encompassing all core error categories.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A connection lifecycle or transport error.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A file or filesystem operation error.
    #[error("File error: {0}")]
    Fs(#[from] FsError),

    /// A configuration error (invalid values, missing fields).
    #[error("Config error: {0}")]
    Config(String),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the connection lifecycle and session operations.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The transport handshake failed (TCP, DNS, FTP greeting).
    #[error("Connection failed: {0}")]
    Transport(String),

    /// The server rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An operation was attempted out of lifecycle order.
    #[error("Invalid connection state: {0}")]
    State(String),

    /// The session went stale or was dropped; reconnect before retrying.
    #[error("Connection lost: {0}")]
    Lost(String),
}

/// Errors raised by file metadata, listing, transfer and save operations.
#[derive(Error, Debug)]
pub enum FsError {
    /// Invalid variant pairing, or a destination that is not a directory.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The requested file or directory was not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Permission was denied for the requested operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A file operation failed (protocol command rejected, transfer abort).
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// A save's backup artifact could not be created or cleaned up.
    #[error("Backup failed: {0}")]
    Backup(String),

    /// The operation partly succeeded; the message states what remains.
    #[error("Partial failure: {0}")]
    PartialFailure(String),

    /// The underlying connection failed mid-operation.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A low-level I/O error on the local side.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
