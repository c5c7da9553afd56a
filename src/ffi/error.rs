//! Status codes and the per-thread error buffer.

use crate::config::ConfigError;
use crate::imaging::BackendError;
use std::cell::RefCell;
use std::ffi::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

thread_local! {
    static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Status returned by every fallible entry point. Zero is success.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixStatus {
    Success = 0,
    /// Unclassified failure, including a caught panic.
    Error = 1,
    UnsupportedFormat = 2,
    InvalidArgument = 3,
    DecodeFailed = 4,
    EncodeFailed = 5,
    ConfigError = 6,
}

impl From<PixStatus> for c_int {
    fn from(status: PixStatus) -> Self {
        status as c_int
    }
}

/// Anything an entry point can fail with.
#[derive(Error, Debug)]
pub(crate) enum FfiError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    InvalidArgument(String),
}

impl FfiError {
    pub(crate) fn null(what: &str) -> Self {
        FfiError::InvalidArgument(format!("Null {what} pointer"))
    }

    pub(crate) fn status(&self) -> PixStatus {
        match self {
            FfiError::Backend(e) => match e {
                BackendError::UnsupportedImageFormat | BackendError::UnsupportedSaveFormat(_) => {
                    PixStatus::UnsupportedFormat
                }
                BackendError::InvalidArgument(_) => PixStatus::InvalidArgument,
                BackendError::DecodeFailed(_) => PixStatus::DecodeFailed,
                BackendError::EncodeFailed(_) => PixStatus::EncodeFailed,
                BackendError::Io(_) => PixStatus::Error,
            },
            FfiError::Config(_) => PixStatus::ConfigError,
            FfiError::InvalidArgument(_) => PixStatus::InvalidArgument,
        }
    }
}

/// Sets the last error message for the current thread.
pub(crate) fn set_last_error(msg: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = msg.into();
    });
}

/// Clears the last error message.
pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|e| {
        e.borrow_mut().clear();
    });
}

pub(crate) fn last_error() -> String {
    LAST_ERROR.with(|e| e.borrow().clone())
}

/// Run an entry point body: clear the error buffer, catch panics, and turn
/// the outcome into a status code.
pub(crate) fn guard(body: impl FnOnce() -> Result<(), FfiError>) -> c_int {
    clear_last_error();
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => PixStatus::Success.into(),
        Ok(Err(e)) => {
            set_last_error(e.to_string());
            e.status().into()
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            set_last_error(format!("internal error: {msg}"));
            PixStatus::Error.into()
        }
    }
}

/// Copies the last error message into `buffer`.
///
/// # Returns
/// The full length of the message (excluding the null terminator). The copy
/// is truncated when the buffer is too small. Passing a null buffer or zero
/// size only queries the length.
///
/// # Safety
/// The buffer must be valid for writes of `buffer_size` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixbridge_error_buffer(buffer: *mut c_char, buffer_size: usize) -> usize {
    if buffer.is_null() || buffer_size == 0 {
        return LAST_ERROR.with(|e| e.borrow().len());
    }

    LAST_ERROR.with(|e| {
        let error = e.borrow();
        let bytes = error.as_bytes();
        let copy_len = bytes.len().min(buffer_size - 1);

        if copy_len > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, copy_len);
            }
        }

        // Null terminate
        unsafe {
            *buffer.add(copy_len) = 0;
        }

        error.len()
    })
}

/// Clears the last error message.
#[unsafe(no_mangle)]
pub extern "C" fn pixbridge_error_clear() {
    clear_last_error();
}
