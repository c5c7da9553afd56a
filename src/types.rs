//! Wire-level enums shared by the Rust API and the C ABI.
//!
//! Discriminants are part of the ABI: hosts pass them as plain integers, so
//! every enum is `#[repr(C)]` with explicit values and converts back from
//! `i32` through [`TryFrom`]. Each enum also has a nickname table, used by
//! [`crate::properties`] to coerce strings into enum values.

use serde::Serialize;
use std::fmt;

/// Error for an integer or nickname that names no variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub enum_name: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has no value \"{}\"", self.enum_name, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Static description of an enum type: its name and `(nick, value)` pairs.
#[derive(Debug)]
pub struct EnumType {
    pub name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumType {
    /// Resolve a nickname to its integer value (case-insensitive).
    pub fn from_nick(&self, nick: &str) -> Result<i32, UnknownVariant> {
        self.values
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(nick))
            .map(|(_, v)| *v)
            .ok_or_else(|| UnknownVariant {
                enum_name: self.name,
                value: nick.to_string(),
            })
    }

    /// Nickname for an integer value, if any.
    pub fn nick(&self, value: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| *n)
    }
}

/// Declares `TryFrom<i32>`, `FromStr`, `nick()` and the static [`EnumType`]
/// for a fieldless enum from one table.
macro_rules! wire_enum {
    ($ty:ident, $table:ident, $name:literal, { $($variant:ident = $value:literal => $nick:literal),+ $(,)? }) => {
        pub static $table: EnumType = EnumType {
            name: $name,
            values: &[$(($nick, $value)),+],
        };

        impl $ty {
            pub fn nick(self) -> &'static str {
                match self {
                    $($ty::$variant => $nick),+
                }
            }

            pub fn enum_type() -> &'static EnumType {
                &$table
            }
        }

        impl TryFrom<i32> for $ty {
            type Error = UnknownVariant;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        enum_name: $name,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $table.from_nick(s).and_then($ty::try_from)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.nick())
            }
        }
    };
}

/// Encoded image format tag. Used purely for dispatch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Unknown = 0,
    Jpeg = 1,
    Webp = 2,
    Png = 3,
    Tiff = 4,
}

wire_enum!(ImageType, IMAGE_TYPE, "ImageType", {
    Unknown = 0 => "unknown",
    Jpeg = 1 => "jpeg",
    Webp = 2 => "webp",
    Png = 3 => "png",
    Tiff = 4 => "tiff",
});

impl ImageType {
    /// All concrete (non-`Unknown`) formats.
    pub const KNOWN: [ImageType; 4] = [
        ImageType::Jpeg,
        ImageType::Webp,
        ImageType::Png,
        ImageType::Tiff,
    ];

    /// Map to the `image` crate's format, `None` for `Unknown`.
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageType::Unknown => None,
            ImageType::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageType::Webp => Some(image::ImageFormat::WebP),
            ImageType::Png => Some(image::ImageFormat::Png),
            ImageType::Tiff => Some(image::ImageFormat::Tiff),
        }
    }

    /// Guess from a file extension (`jpg`, `jpeg`, `png`, `tif`, `tiff`, `webp`).
    pub fn from_extension(ext: &str) -> ImageType {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ImageType::Jpeg,
            "png" => ImageType::Png,
            "tif" | "tiff" => ImageType::Tiff,
            "webp" => ImageType::Webp,
            _ => ImageType::Unknown,
        }
    }

    /// Preferred file extension for output files.
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Unknown | ImageType::Jpeg => "jpg",
            ImageType::Webp => "webp",
            ImageType::Png => "png",
            ImageType::Tiff => "tiff",
        }
    }
}

/// Resampling kernel for [`crate::imaging::operations::resize_image`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kernel {
    Nearest = 0,
    Linear = 1,
    Cubic = 2,
    Lanczos2 = 3,
    #[default]
    Lanczos3 = 4,
}

wire_enum!(Kernel, KERNEL, "Kernel", {
    Nearest = 0 => "nearest",
    Linear = 1 => "linear",
    Cubic = 2 => "cubic",
    Lanczos2 = 3 => "lanczos2",
    Lanczos3 = 4 => "lanczos3",
});

/// Where the image sits on a larger canvas.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompassDirection {
    #[default]
    Centre = 0,
    North = 1,
    East = 2,
    South = 3,
    West = 4,
    NorthEast = 5,
    SouthEast = 6,
    SouthWest = 7,
    NorthWest = 8,
}

wire_enum!(CompassDirection, COMPASS_DIRECTION, "CompassDirection", {
    Centre = 0 => "centre",
    North = 1 => "north",
    East = 2 => "east",
    South = 3 => "south",
    West = 4 => "west",
    NorthEast = 5 => "north-east",
    SouthEast = 6 => "south-east",
    SouthWest = 7 => "south-west",
    NorthWest = 8 => "north-west",
});

/// How pixels outside the source image are generated.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extend {
    /// All bands zero, alpha included.
    #[default]
    Black = 0,
    /// Repeat the nearest edge pixel.
    Copy = 1,
    /// Tile the whole image.
    Repeat = 2,
    /// Reflect the whole image.
    Mirror = 3,
    /// All bands at maximum, alpha included.
    White = 4,
    /// Fill with the background colour.
    Background = 5,
}

wire_enum!(Extend, EXTEND, "Extend", {
    Black = 0 => "black",
    Copy = 1 => "copy",
    Repeat = 2 => "repeat",
    Mirror = 3 => "mirror",
    White = 4 => "white",
    Background = 5 => "background",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_discriminants_are_stable() {
        assert_eq!(ImageType::Unknown as i32, 0);
        assert_eq!(ImageType::Jpeg as i32, 1);
        assert_eq!(ImageType::Webp as i32, 2);
        assert_eq!(ImageType::Png as i32, 3);
        assert_eq!(ImageType::Tiff as i32, 4);
        assert_eq!(Kernel::Lanczos3 as i32, 4);
        assert_eq!(CompassDirection::NorthWest as i32, 8);
        assert_eq!(Extend::Background as i32, 5);
    }

    #[test]
    fn try_from_rejects_out_of_range() {
        assert_eq!(Kernel::try_from(2), Ok(Kernel::Cubic));
        assert!(Kernel::try_from(5).is_err());
        assert!(CompassDirection::try_from(-1).is_err());
    }

    #[test]
    fn extend_last_sentinel_is_not_a_mode() {
        let err = Extend::try_from(6).unwrap_err();
        assert_eq!(err.enum_name, "Extend");
        assert_eq!(err.to_string(), "Extend has no value \"6\"");
    }

    #[test]
    fn parse_from_nick() {
        assert_eq!("lanczos2".parse::<Kernel>(), Ok(Kernel::Lanczos2));
        assert_eq!(
            "north-east".parse::<CompassDirection>(),
            Ok(CompassDirection::NorthEast)
        );
        assert_eq!("WHITE".parse::<Extend>(), Ok(Extend::White));
        assert!("sideways".parse::<CompassDirection>().is_err());
    }

    #[test]
    fn nick_roundtrips_through_enum_type() {
        for direction in [
            CompassDirection::Centre,
            CompassDirection::South,
            CompassDirection::SouthWest,
        ] {
            let value = COMPASS_DIRECTION.from_nick(direction.nick()).unwrap();
            assert_eq!(value, direction as i32);
        }
        assert_eq!(EXTEND.nick(2), Some("repeat"));
        assert_eq!(EXTEND.nick(6), None);
    }

    #[test]
    fn image_type_from_extension() {
        assert_eq!(ImageType::from_extension("JPG"), ImageType::Jpeg);
        assert_eq!(ImageType::from_extension("tif"), ImageType::Tiff);
        assert_eq!(ImageType::from_extension("gif"), ImageType::Unknown);
        assert_eq!(ImageType::Unknown.extension(), "jpg");
    }
}
