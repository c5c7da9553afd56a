//! Name-addressed operations, configured through [`properties`](crate::properties).
//!
//! An [`Operation`] is created from its nickname, its arguments are set one
//! at a time with [`set_property`](crate::properties::set_property), and it is
//! then applied to an image. This is the path hosts use when they build
//! requests from configuration strings rather than typed calls.
//!
//! | Nickname | Arguments |
//! |---|---|
//! | `resize` | `scale`, `vscale`, `kernel` |
//! | `extract_area` | `left`, `top`, `width`, `height` |
//! | `gravity` | `direction`, `width`, `height`, `extend`, `red`, `green`, `blue` |
//! | `save` | `format`, `quality`, `compression`, `interlace`, `lossless`, `strip` |

use crate::config::ExportConfig;
use crate::imaging::{self, BackendError, ExportParams, ImageBackend, ImageRef};
use crate::properties::{ArgumentKind, ArgumentSpec, Introspect, PropertyError, TypedValue};
use crate::types::{
    COMPASS_DIRECTION, CompassDirection, EXTEND, Extend, IMAGE_TYPE, ImageType, KERNEL, Kernel,
    UnknownVariant,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub scale: f64,
    pub vscale: f64,
    pub kernel: Kernel,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            vscale: 0.0,
            kernel: Kernel::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GravityOptions {
    pub direction: CompassDirection,
    pub width: i64,
    pub height: i64,
    pub extend: Extend,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// A configurable image operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Resize(ResizeOptions),
    ExtractArea(ExtractOptions),
    Gravity(GravityOptions),
    Save(ExportParams),
}

/// What applying an operation produced.
#[derive(Debug)]
pub enum OperationOutput {
    Image(ImageRef),
    Buffer(Vec<u8>),
}

static RESIZE_ARGS: [ArgumentSpec; 3] = [
    ArgumentSpec::new("scale", ArgumentKind::Double),
    ArgumentSpec::new("vscale", ArgumentKind::Double),
    ArgumentSpec::new("kernel", ArgumentKind::Enum(&KERNEL)),
];

static EXTRACT_ARGS: [ArgumentSpec; 4] = [
    ArgumentSpec::new("left", ArgumentKind::Int),
    ArgumentSpec::new("top", ArgumentKind::Int),
    ArgumentSpec::new("width", ArgumentKind::Int),
    ArgumentSpec::new("height", ArgumentKind::Int),
];

static GRAVITY_ARGS: [ArgumentSpec; 7] = [
    ArgumentSpec::new("direction", ArgumentKind::Enum(&COMPASS_DIRECTION)),
    ArgumentSpec::new("width", ArgumentKind::Int),
    ArgumentSpec::new("height", ArgumentKind::Int),
    ArgumentSpec::new("extend", ArgumentKind::Enum(&EXTEND)),
    ArgumentSpec::new("red", ArgumentKind::Double),
    ArgumentSpec::new("green", ArgumentKind::Double),
    ArgumentSpec::new("blue", ArgumentKind::Double),
];

static SAVE_ARGS: [ArgumentSpec; 6] = [
    ArgumentSpec::new("format", ArgumentKind::Enum(&IMAGE_TYPE)),
    ArgumentSpec::new("quality", ArgumentKind::Int),
    ArgumentSpec::new("compression", ArgumentKind::Int),
    ArgumentSpec::new("interlace", ArgumentKind::Bool),
    ArgumentSpec::new("lossless", ArgumentKind::Bool),
    ArgumentSpec::new("strip", ArgumentKind::Bool),
];

impl Operation {
    /// Create an operation with default arguments from its nickname.
    pub fn new(nickname: &str) -> Option<Self> {
        match nickname {
            "resize" => Some(Operation::Resize(ResizeOptions::default())),
            "extract_area" => Some(Operation::ExtractArea(ExtractOptions::default())),
            "gravity" => Some(Operation::Gravity(GravityOptions::default())),
            "save" => Some(Operation::Save(ExportParams::default())),
            _ => None,
        }
    }

    pub fn nicknames() -> &'static [&'static str] {
        &["resize", "extract_area", "gravity", "save"]
    }

    /// Run the operation. Image operations return a new image; `save`
    /// returns the encoded buffer.
    pub fn apply(
        &self,
        backend: &impl ImageBackend,
        image: &ImageRef,
        defaults: &ExportConfig,
    ) -> Result<OperationOutput, BackendError> {
        let output = match self {
            Operation::Resize(o) => OperationOutput::Image(imaging::resize_image(
                backend, image, o.scale, o.vscale, o.kernel,
            )?),
            Operation::ExtractArea(o) => OperationOutput::Image(imaging::extract_image_area(
                backend, image, o.left, o.top, o.width, o.height,
            )?),
            Operation::Gravity(o) => OperationOutput::Image(imaging::gravity_image(
                backend,
                image,
                o.direction,
                o.width,
                o.height,
                o.extend,
                o.red,
                o.green,
                o.blue,
            )?),
            Operation::Save(params) => {
                OperationOutput::Buffer(imaging::save_buffer(backend, image, params, defaults)?)
            }
        };
        Ok(output)
    }
}

fn enum_value<T>(object: &'static str, value: TypedValue) -> Result<T, PropertyError>
where
    T: TryFrom<i32, Error = UnknownVariant>,
{
    T::try_from(value.as_enum()).map_err(|source| PropertyError::UnknownEnumNick { object, source })
}

impl Introspect for Operation {
    fn nickname(&self) -> &'static str {
        match self {
            Operation::Resize(_) => "resize",
            Operation::ExtractArea(_) => "extract_area",
            Operation::Gravity(_) => "gravity",
            Operation::Save(_) => "save",
        }
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        match self {
            Operation::Resize(_) => &RESIZE_ARGS,
            Operation::ExtractArea(_) => &EXTRACT_ARGS,
            Operation::Gravity(_) => &GRAVITY_ARGS,
            Operation::Save(_) => &SAVE_ARGS,
        }
    }

    fn set_argument(&mut self, name: &str, value: TypedValue) -> Result<(), PropertyError> {
        let object = self.nickname();
        match (self, name) {
            (Operation::Resize(o), "scale") => o.scale = value.as_double(),
            (Operation::Resize(o), "vscale") => o.vscale = value.as_double(),
            (Operation::Resize(o), "kernel") => o.kernel = enum_value(object, value)?,

            (Operation::ExtractArea(o), "left") => o.left = value.as_int(),
            (Operation::ExtractArea(o), "top") => o.top = value.as_int(),
            (Operation::ExtractArea(o), "width") => o.width = value.as_int(),
            (Operation::ExtractArea(o), "height") => o.height = value.as_int(),

            (Operation::Gravity(o), "direction") => o.direction = enum_value(object, value)?,
            (Operation::Gravity(o), "width") => o.width = value.as_int(),
            (Operation::Gravity(o), "height") => o.height = value.as_int(),
            (Operation::Gravity(o), "extend") => o.extend = enum_value(object, value)?,
            (Operation::Gravity(o), "red") => o.red = value.as_double(),
            (Operation::Gravity(o), "green") => o.green = value.as_double(),
            (Operation::Gravity(o), "blue") => o.blue = value.as_double(),

            (Operation::Save(p), "format") => p.format = enum_value::<ImageType>(object, value)?,
            (Operation::Save(p), "quality") => p.quality = value.as_int().clamp(0, 100) as u32,
            (Operation::Save(p), "compression") => {
                p.compression = value.as_int().clamp(0, 9) as u32
            }
            (Operation::Save(p), "interlace") => p.interlaced = value.as_bool(),
            (Operation::Save(p), "lossless") => p.lossless = value.as_bool(),
            (Operation::Save(p), "strip") => p.strip_metadata = value.as_bool(),

            (_, name) => {
                return Err(PropertyError::UnknownArgument {
                    object,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::properties::{Value, set_property, try_set_property};
    use crate::test_helpers::gradient_rgb;

    fn image(width: u32, height: u32) -> ImageRef {
        ImageRef::new(gradient_rgb(width, height), ImageType::Png)
    }

    #[test]
    fn new_from_nickname() {
        for nick in Operation::nicknames() {
            let op = Operation::new(nick).unwrap();
            assert_eq!(op.nickname(), *nick);
        }
        assert!(Operation::new("blur").is_none());
    }

    #[test]
    fn every_declared_argument_is_settable() {
        for nick in Operation::nicknames() {
            let mut op = Operation::new(nick).unwrap();
            for spec in op.arguments() {
                let value = match spec.kind {
                    ArgumentKind::Int => Value::Int(1),
                    ArgumentKind::Double => Value::Double(0.5),
                    ArgumentKind::Bool => Value::Bool(true),
                    ArgumentKind::Enum(t) => Value::String(t.values[1].0.to_string()),
                };
                try_set_property(&mut op, spec.name, &value)
                    .unwrap_or_else(|e| panic!("{nick}.{}: {e}", spec.name));
            }
        }
    }

    #[test]
    fn resize_kernel_from_nick() {
        let mut op = Operation::new("resize").unwrap();
        set_property(&mut op, "kernel", &Value::String("lanczos2".into()));
        set_property(&mut op, "scale", &Value::Double(0.25));
        assert_eq!(
            op,
            Operation::Resize(ResizeOptions {
                scale: 0.25,
                vscale: 0.0,
                kernel: Kernel::Lanczos2,
            })
        );
    }

    #[test]
    fn bad_nick_keeps_previous_value() {
        let mut op = Operation::new("gravity").unwrap();
        set_property(&mut op, "direction", &Value::String("south".into()));
        set_property(&mut op, "direction", &Value::String("down".into()));
        let Operation::Gravity(options) = op else {
            panic!("expected gravity");
        };
        assert_eq!(options.direction, CompassDirection::South);
    }

    #[test]
    fn arguments_are_per_operation() {
        let mut op = Operation::new("resize").unwrap();
        let result = try_set_property(&mut op, "left", &Value::Int(3));
        assert!(matches!(result, Err(PropertyError::UnknownArgument { .. })));
    }

    #[test]
    fn apply_resize() {
        let mut op = Operation::new("resize").unwrap();
        set_property(&mut op, "scale", &Value::Double(0.5));
        let output = op
            .apply(&RustBackend::new(), &image(40, 20), &ExportConfig::default())
            .unwrap();
        let OperationOutput::Image(resized) = output else {
            panic!("resize should produce an image");
        };
        assert_eq!(resized.dimensions(), (20, 10));
    }

    #[test]
    fn apply_extract_and_gravity() {
        let backend = RustBackend::new();
        let defaults = ExportConfig::default();

        let mut crop = Operation::new("extract_area").unwrap();
        for (name, v) in [("left", 2), ("top", 2), ("width", 5), ("height", 4)] {
            set_property(&mut crop, name, &Value::Int(v));
        }
        let OperationOutput::Image(cropped) = crop.apply(&backend, &image(10, 10), &defaults).unwrap()
        else {
            panic!("extract_area should produce an image");
        };
        assert_eq!(cropped.dimensions(), (5, 4));

        let mut pad = Operation::new("gravity").unwrap();
        set_property(&mut pad, "width", &Value::Int(12));
        set_property(&mut pad, "height", &Value::Int(12));
        set_property(&mut pad, "extend", &Value::String("white".into()));
        let OperationOutput::Image(padded) = pad.apply(&backend, &cropped, &defaults).unwrap()
        else {
            panic!("gravity should produce an image");
        };
        assert_eq!(padded.dimensions(), (12, 12));
    }

    #[test]
    fn apply_save_returns_buffer() {
        let mut op = Operation::new("save").unwrap();
        set_property(&mut op, "format", &Value::String("png".into()));
        set_property(&mut op, "strip", &Value::Bool(true));
        let output = op
            .apply(&RustBackend::new(), &image(6, 6), &ExportConfig::default())
            .unwrap();
        let OperationOutput::Buffer(bytes) = output else {
            panic!("save should produce a buffer");
        };
        assert_eq!(imaging::determine_image_type(&bytes), ImageType::Png);
    }

    #[test]
    fn apply_with_invalid_arguments_errors() {
        let op = Operation::new("extract_area").unwrap();
        let result = op.apply(&RustBackend::new(), &image(4, 4), &ExportConfig::default());
        assert!(matches!(result, Err(BackendError::InvalidArgument(_))));
    }
}
