//! # pixbridge
//!
//! A small image engine with a C ABI: sniff, decode, resize, crop, pad and
//! encode JPEG, PNG, WebP and TIFF buffers. Hosts in other languages link the
//! `cdylib`/`staticlib` and drive it through `include/pixbridge.h`; the same
//! engine is usable as a Rust library and from the `pixbridge` CLI.
//!
//! # Layers
//!
//! ```text
//! ffi          C entry points, handles, status codes, per-thread error text
//!   │
//! operation    name-addressed operations (resize, extract_area, gravity, save)
//! properties   set-by-name with enum-from-nick coercion
//!   │
//! imaging      typed operations → ImageBackend → `image` crate
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | ABI enums (`ImageType`, `Kernel`, `CompassDirection`, `Extend`) and their nick tables |
//! | [`imaging`] | Format sniffing, decode/encode, resize, extract area, gravity |
//! | [`properties`] | Loosely typed values set by name, with enum nicknames resolved |
//! | [`operation`] | Operations configured through [`properties`] and applied to images |
//! | [`config`] | `pixbridge.toml` startup settings: decoder limits, save defaults |
//! | [`runtime`] | Process-wide startup/shutdown state and live-handle accounting |
//! | [`ffi`] | The C ABI |
//! | [`convert`] | File and directory conversion for the CLI |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and encoding go through the `image` crate only. No system
//! libraries need to be present at build or run time, so the `cdylib` can be
//! dropped next to any host.
//!
//! ## Processing Never Consumes Input
//!
//! Every processing call returns a new image and leaves its input valid.
//! Hosts release each handle they receive exactly once, which keeps the
//! ownership rule the same for every function.
//!
//! ## Lenient Property Setting
//!
//! Setting an unknown property or an unknown enum nickname logs a warning
//! and leaves the object unchanged instead of failing. Configuration
//! assembled from user strings degrades to defaults rather than aborting a
//! whole request.

pub mod config;
pub mod convert;
pub mod ffi;
pub mod imaging;
pub mod operation;
pub mod properties;
pub mod runtime;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
