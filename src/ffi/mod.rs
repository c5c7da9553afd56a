//! C ABI.
//!
//! Every fallible function returns a status code (`0` on success, see
//! [`PixStatus`]) and records a message readable with
//! [`pixbridge_error_buffer`](error::pixbridge_error_buffer). The message is
//! per thread and cleared at the start of each call. Panics never cross the
//! boundary; they surface as status `1`.
//!
//! Enum arguments use the numeric values of [`ImageType`](crate::types::ImageType),
//! [`Kernel`](crate::types::Kernel), [`CompassDirection`](crate::types::CompassDirection)
//! and [`Extend`](crate::types::Extend). The matching C declarations live in
//! `include/pixbridge.h`.
//!
//! Ownership: images and operations are heap handles released with
//! `image_unref` / `operation_free`; encoded buffers are released with
//! `pixbridge_free_buffer`. Processing calls never consume their input.

pub mod error;
pub mod image;
pub mod operation;

pub use error::PixStatus;

use crate::config::{StartupConfig, load_config};
use crate::runtime;
use error::{FfiError, guard};
use std::ffi::{CStr, c_char, c_int};
use std::path::Path;

/// Starts the library. `config_path` may be null for the defaults, or point
/// to a TOML config file.
///
/// # Safety
/// `config_path` must be null or a valid C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pixbridge_startup(config_path: *const c_char) -> c_int {
    guard(|| {
        let config = if config_path.is_null() {
            StartupConfig::default()
        } else {
            let path = unsafe { CStr::from_ptr(config_path) }
                .to_str()
                .map_err(|_| FfiError::InvalidArgument("config path is not UTF-8".into()))?;
            load_config(Path::new(path))?
        };
        runtime::startup(Some(config))?;
        Ok(())
    })
}

/// Stops the library, warning about leaked handles when configured to.
#[unsafe(no_mangle)]
pub extern "C" fn pixbridge_shutdown() {
    runtime::shutdown();
}

/// Library version packed as `(major << 24) | (minor << 16) | (patch << 8)`.
#[unsafe(no_mangle)]
pub extern "C" fn pixbridge_version() -> u32 {
    let part = |s: &str| s.parse::<u32>().unwrap_or(0) & 0xff;
    part(env!("CARGO_PKG_VERSION_MAJOR")) << 24
        | part(env!("CARGO_PKG_VERSION_MINOR")) << 16
        | part(env!("CARGO_PKG_VERSION_PATCH")) << 8
}
