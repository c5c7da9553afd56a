//! Name-addressed operations for hosts that configure work from strings.
//!
//! ```c
//! PixOperation *op = operation_new("resize");
//! PixValue scale = { .kind = PIX_VALUE_DOUBLE, .double_value = 0.5 };
//! PixValue kernel = { .kind = PIX_VALUE_STRING, .string_value = "lanczos2" };
//! gobject_set_property(op, "scale", &scale);
//! gobject_set_property(op, "kernel", &kernel);
//! operation_apply_image(op, in, &out);
//! operation_free(op);
//! ```

use super::error::{FfiError, clear_last_error, guard};
use super::image::{PixImage, image_ref, into_handle, store_buffer};
use crate::operation::{Operation, OperationOutput};
use crate::properties::{self, Value};
use crate::runtime;
use std::ffi::{CStr, c_char, c_int};

/// Opaque operation handle.
pub struct PixOperation {
    inner: Operation,
}

/// Tags for [`PixValue::kind`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixValueKind {
    Int = 0,
    Double = 1,
    Bool = 2,
    String = 3,
}

impl TryFrom<c_int> for PixValueKind {
    type Error = c_int;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Int),
            1 => Ok(Self::Double),
            2 => Ok(Self::Bool),
            3 => Ok(Self::String),
            other => Err(other),
        }
    }
}

/// A tagged property value. Only the field selected by `kind` (a
/// [`PixValueKind`]) is read.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PixValue {
    pub kind: c_int,
    pub int_value: i64,
    pub double_value: f64,
    pub string_value: *const c_char,
}

impl PixValue {
    /// # Safety
    /// For `String` values, `string_value` must be null or a valid C string.
    unsafe fn to_value(self) -> Result<Value, String> {
        let kind = PixValueKind::try_from(self.kind)
            .map_err(|kind| format!("unknown value kind {kind}"))?;
        Ok(match kind {
            PixValueKind::Int => Value::Int(self.int_value),
            PixValueKind::Double => Value::Double(self.double_value),
            PixValueKind::Bool => Value::Bool(self.int_value != 0),
            PixValueKind::String => {
                if self.string_value.is_null() {
                    return Err("null string".into());
                }
                let s = unsafe { CStr::from_ptr(self.string_value) };
                Value::String(s.to_string_lossy().into_owned())
            }
        })
    }
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

unsafe fn operation_ref<'a>(op: *const PixOperation) -> Result<&'a Operation, FfiError> {
    unsafe { op.as_ref() }
        .map(|handle| &handle.inner)
        .ok_or_else(|| FfiError::null("operation"))
}

/// Creates an operation with default arguments, or returns null for an
/// unknown nickname.
///
/// # Safety
/// `nickname` must be null or a valid C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn operation_new(nickname: *const c_char) -> *mut PixOperation {
    let Some(nick) = (unsafe { c_str(nickname) }) else {
        return std::ptr::null_mut();
    };
    match Operation::new(nick) {
        Some(inner) => Box::into_raw(Box::new(PixOperation { inner })),
        None => {
            log::warn!("unknown operation nickname={nick}");
            std::ptr::null_mut()
        }
    }
}

/// Releases an operation handle.
///
/// # Safety
/// `op` must be null or a handle from [`operation_new`]; it is invalid afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn operation_free(op: *mut PixOperation) {
    if !op.is_null() {
        unsafe { drop(Box::from_raw(op)) };
    }
}

/// Sets an argument by name. String values for enum arguments are
/// resolved as nicknames first.
///
/// Never fails: problems are logged as warnings and the operation is left
/// unchanged.
///
/// # Safety
/// `op` must be null or a live handle, `name` null or a valid C string, and
/// `value` null or a valid [`PixValue`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gobject_set_property(
    op: *mut PixOperation,
    name: *const c_char,
    value: *const PixValue,
) {
    let (Some(op), Some(name), Some(value)) =
        (unsafe { op.as_mut() }, unsafe { c_str(name) }, unsafe { value.as_ref() })
    else {
        log::warn!("gobject_set_property called with a null argument");
        return;
    };
    match unsafe { value.to_value() } {
        Ok(value) => properties::set_property(&mut op.inner, name, &value),
        Err(problem) => log::warn!("property warning: {problem} for \"{name}\""),
    }
    clear_last_error();
}

/// Applies an image-producing operation, writing a new handle to `out`.
///
/// # Safety
/// `op` and `input` must be live handles and `out` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn operation_apply_image(
    op: *const PixOperation,
    input: *const PixImage,
    out: *mut *mut PixImage,
) -> c_int {
    guard(|| {
        let op = unsafe { operation_ref(op) }?;
        let image = unsafe { image_ref(input) }?;
        if out.is_null() {
            return Err(FfiError::null("out"));
        }
        if matches!(op, Operation::Save(_)) {
            return Err(FfiError::InvalidArgument(
                "operation produces a buffer, use operation_apply_buffer".into(),
            ));
        }
        if let OperationOutput::Image(result) =
            op.apply(&runtime::backend(), image, &runtime::config().export)?
        {
            unsafe { *out = into_handle(result) };
        }
        Ok(())
    })
}

/// Applies a `save` operation, writing the encoded bytes to `buf`/`len`.
///
/// # Safety
/// `op` and `input` must be live handles; `buf` and `len` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn operation_apply_buffer(
    op: *const PixOperation,
    input: *const PixImage,
    buf: *mut *mut u8,
    len: *mut usize,
) -> c_int {
    guard(|| {
        let op = unsafe { operation_ref(op) }?;
        let image = unsafe { image_ref(input) }?;
        if !matches!(op, Operation::Save(_)) {
            return Err(FfiError::InvalidArgument(
                "operation produces an image, use operation_apply_image".into(),
            ));
        }
        match op.apply(&runtime::backend(), image, &runtime::config().export)? {
            OperationOutput::Buffer(bytes) => unsafe { store_buffer(buf, len, bytes) },
            OperationOutput::Image(_) => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::{PixStatus, last_error};
    use crate::ffi::image::{image_height, image_unref, image_width, pixbridge_free_buffer};
    use crate::imaging::{self, ImageRef};
    use crate::test_helpers::gradient_rgb;
    use crate::types::{ImageType, Kernel};
    use std::ptr;

    fn value_str(s: &CStr) -> PixValue {
        PixValue {
            kind: PixValueKind::String as c_int,
            int_value: 0,
            double_value: 0.0,
            string_value: s.as_ptr(),
        }
    }

    fn value_int(i: i64) -> PixValue {
        PixValue {
            kind: PixValueKind::Int as c_int,
            int_value: i,
            double_value: 0.0,
            string_value: ptr::null(),
        }
    }

    fn value_double(d: f64) -> PixValue {
        PixValue {
            kind: PixValueKind::Double as c_int,
            int_value: 0,
            double_value: d,
            string_value: ptr::null(),
        }
    }

    fn new_op(nick: &CStr) -> *mut PixOperation {
        let op = unsafe { operation_new(nick.as_ptr()) };
        assert!(!op.is_null());
        op
    }

    #[test]
    fn unknown_nickname_returns_null() {
        unsafe {
            assert!(operation_new(c"sharpen".as_ptr()).is_null());
            assert!(operation_new(ptr::null()).is_null());
            operation_free(ptr::null_mut());
        }
    }

    #[test]
    fn set_enum_from_nick() {
        let op = new_op(c"resize");
        unsafe {
            gobject_set_property(op, c"kernel".as_ptr(), &value_str(c"lanczos2"));
            let Operation::Resize(options) = &(*op).inner else {
                panic!("expected resize");
            };
            assert_eq!(options.kernel, Kernel::Lanczos2);
            operation_free(op);
        }
    }

    #[test]
    fn bad_values_only_warn() {
        let op = new_op(c"resize");
        unsafe {
            gobject_set_property(op, c"kernel".as_ptr(), &value_str(c"bicubic-ish"));
            gobject_set_property(op, c"nonexistent".as_ptr(), &value_int(1));
            gobject_set_property(op, ptr::null(), &value_int(1));
            gobject_set_property(op, c"kernel".as_ptr(), ptr::null());
            let null_string = value_str(c"");
            let null_string = PixValue {
                string_value: ptr::null(),
                ..null_string
            };
            gobject_set_property(op, c"kernel".as_ptr(), &null_string);
            let undeclared = PixValue {
                kind: 7,
                ..value_str(c"nearest")
            };
            gobject_set_property(op, c"kernel".as_ptr(), &undeclared);
            assert_eq!(last_error(), "");
            let Operation::Resize(options) = &(*op).inner else {
                panic!("expected resize");
            };
            assert_eq!(options.kernel, Kernel::Lanczos3);
            operation_free(op);
        }
    }

    #[test]
    fn apply_image_and_buffer() {
        let input = into_handle(ImageRef::new(gradient_rgb(20, 10), ImageType::Png));
        let resize = new_op(c"resize");
        let save = new_op(c"save");
        unsafe {
            gobject_set_property(resize, c"scale".as_ptr(), &value_double(0.5));
            let mut out = ptr::null_mut();
            assert_eq!(operation_apply_image(resize, input, &mut out), 0);
            assert_eq!((image_width(out), image_height(out)), (10, 5));

            gobject_set_property(save, c"format".as_ptr(), &value_str(c"png"));
            let mut buf = ptr::null_mut();
            let mut len = 0;
            assert_eq!(operation_apply_buffer(save, out, &mut buf, &mut len), 0);
            let bytes = std::slice::from_raw_parts(buf, len);
            assert_eq!(imaging::determine_image_type(bytes), ImageType::Png);
            pixbridge_free_buffer(buf, len);

            // wrong entry point for each kind
            assert_eq!(
                operation_apply_buffer(resize, input, &mut buf, &mut len),
                PixStatus::InvalidArgument as c_int
            );
            let mut unused = ptr::null_mut();
            assert_eq!(
                operation_apply_image(save, input, &mut unused),
                PixStatus::InvalidArgument as c_int
            );
            assert!(unused.is_null());

            image_unref(out);
            image_unref(input);
            operation_free(resize);
            operation_free(save);
        }
    }
}
