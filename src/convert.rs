//! File-level conversion used by the `pixbridge` CLI.
//!
//! A conversion decodes a file, runs a pipeline of [`Operation`]s configured
//! through `op.name=value` settings, and saves the result in the target
//! format:
//!
//! ```text
//! pixbridge convert in.jpg out.webp --set resize.scale=0.5 --set resize.kernel=lanczos2
//! ```
//!
//! Operations run in the order their first setting appears. Settings on
//! `save` override the encoder options; `save.format` is ignored because
//! the output extension decides the format.
//!
//! Batch mode walks a directory tree and converts every decodable file in
//! parallel on the rayon pool, mirroring the tree under the output root.

use crate::config::ExportConfig;
use crate::imaging::{self, BackendError, ExportParams, ImageBackend, ImageRef};
use crate::operation::{Operation, OperationOutput};
use crate::properties::{Introspect, Value, set_property};
use crate::types::ImageType;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid setting {0:?}: expected op.name=value")]
    InvalidSetting(String),
    #[error("Unknown operation {0:?}")]
    UnknownOperation(String),
    #[error("Cannot determine output format for {0}")]
    UnknownOutputFormat(PathBuf),
}

/// One `op.name=value` setting from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub operation: String,
    pub name: String,
    pub value: Value,
}

impl FromStr for Setting {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConvertError::InvalidSetting(s.to_string());
        let (key, value) = s.split_once('=').ok_or_else(invalid)?;
        let (operation, name) = key.split_once('.').ok_or_else(invalid)?;
        if operation.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(Setting {
            operation: operation.to_string(),
            name: name.to_string(),
            value: Value::parse(value),
        })
    }
}

/// What `identify` reports about an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: ImageType,
    pub width: u32,
    pub height: u32,
    pub bands: u8,
    pub has_alpha: bool,
}

impl From<&ImageRef> for ImageInfo {
    fn from(image: &ImageRef) -> Self {
        ImageInfo {
            format: image.format(),
            width: image.width(),
            height: image.height(),
            bands: image.bands(),
            has_alpha: imaging::has_alpha_channel(image),
        }
    }
}

/// A pipeline of operations followed by a save.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    steps: Vec<Operation>,
    save: Operation,
}

impl Pipeline {
    /// Build a pipeline from settings, in order of first appearance.
    pub fn from_settings(settings: &[Setting]) -> Result<Self, ConvertError> {
        let mut steps: Vec<Operation> = Vec::new();
        let mut save = Operation::Save(ExportParams::default());

        for setting in settings {
            if setting.operation == "save" {
                set_property(&mut save, &setting.name, &setting.value);
                continue;
            }
            let index = match steps
                .iter()
                .position(|op| op.nickname() == setting.operation)
            {
                Some(i) => i,
                None => {
                    let op = Operation::new(&setting.operation)
                        .ok_or_else(|| ConvertError::UnknownOperation(setting.operation.clone()))?;
                    steps.push(op);
                    steps.len() - 1
                }
            };
            set_property(&mut steps[index], &setting.name, &setting.value);
        }

        Ok(Pipeline { steps, save })
    }

    pub fn steps(&self) -> &[Operation] {
        &self.steps
    }

    /// Run the pipeline and encode as `format`.
    pub fn run(
        &self,
        backend: &impl ImageBackend,
        image: ImageRef,
        format: ImageType,
        defaults: &ExportConfig,
    ) -> Result<(ImageRef, Vec<u8>), BackendError> {
        let mut current = image;
        for step in &self.steps {
            if let OperationOutput::Image(next) = step.apply(backend, &current, defaults)? {
                current = next;
            }
        }

        let mut save = self.save.clone();
        if let Operation::Save(params) = &mut save {
            params.format = format;
        }
        match save.apply(backend, &current, defaults)? {
            OperationOutput::Buffer(bytes) => Ok((current, bytes)),
            OperationOutput::Image(_) => Ok((current, Vec::new())),
        }
    }
}

/// Decode a file and describe it.
pub fn identify_file(backend: &impl ImageBackend, path: &Path) -> Result<ImageInfo, ConvertError> {
    let buf = std::fs::read(path)?;
    let image = imaging::init_image(backend, &buf).map_err(|source| ConvertError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageInfo::from(&image))
}

fn output_format(path: &Path) -> Result<ImageType, ConvertError> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(ImageType::from_extension)
        .unwrap_or(ImageType::Unknown);
    if format == ImageType::Unknown {
        return Err(ConvertError::UnknownOutputFormat(path.to_path_buf()));
    }
    Ok(format)
}

/// Convert one file. The output format comes from `output`'s extension.
pub fn convert_file(
    backend: &impl ImageBackend,
    input: &Path,
    output: &Path,
    pipeline: &Pipeline,
    defaults: &ExportConfig,
) -> Result<ImageInfo, ConvertError> {
    let format = output_format(output)?;
    let buf = std::fs::read(input)?;
    let image_error = |source| ConvertError::Image {
        path: input.to_path_buf(),
        source,
    };

    let image = imaging::init_image(backend, &buf).map_err(image_error)?;
    let (result, bytes) = pipeline
        .run(backend, image, format, defaults)
        .map_err(image_error)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, bytes)?;

    let mut info = ImageInfo::from(&result);
    info.format = format;
    Ok(info)
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<(PathBuf, ImageInfo)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Files under `root` whose extension names a decodable format, sorted.
pub fn find_images(root: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let known = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(ImageType::from_extension)
            .is_some_and(imaging::is_type_supported);
        if known {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every image under `input_dir` into `output_dir` as `format`.
///
/// Individual failures are collected, not fatal.
pub fn batch_convert(
    backend: &impl ImageBackend,
    input_dir: &Path,
    output_dir: &Path,
    format: ImageType,
    pipeline: &Pipeline,
    defaults: &ExportConfig,
) -> Result<BatchReport, ConvertError> {
    let files = find_images(input_dir)?;
    log::info!(
        "Converting {} file(s) from {} to {format}",
        files.len(),
        input_dir.display()
    );

    let results: Vec<_> = files
        .par_iter()
        .map(|input| {
            let relative = input.strip_prefix(input_dir).unwrap_or(input);
            let output = output_dir.join(relative).with_extension(format.extension());
            let result = convert_file(backend, input, &output, pipeline, defaults);
            (output, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (output, result) in results {
        match result {
            Ok(info) => report.converted.push((output, info)),
            Err(e) => {
                log::warn!("{e}");
                report.failed.push((output, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::operation::ResizeOptions;
    use crate::test_helpers::write_test_image;
    use crate::types::Kernel;
    use tempfile::TempDir;

    fn settings(items: &[&str]) -> Vec<Setting> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn parse_setting() {
        let setting: Setting = "resize.kernel=lanczos2".parse().unwrap();
        assert_eq!(setting.operation, "resize");
        assert_eq!(setting.name, "kernel");
        assert_eq!(setting.value, Value::String("lanczos2".into()));

        assert!("resize.kernel".parse::<Setting>().is_err());
        assert!("kernel=lanczos2".parse::<Setting>().is_err());
        assert!(".kernel=x".parse::<Setting>().is_err());
    }

    #[test]
    fn pipeline_groups_settings_by_operation() {
        let pipeline = Pipeline::from_settings(&settings(&[
            "resize.scale=0.5",
            "save.quality=70",
            "resize.kernel=nearest",
        ]))
        .unwrap();
        assert_eq!(
            pipeline.steps(),
            &[Operation::Resize(ResizeOptions {
                scale: 0.5,
                vscale: 0.0,
                kernel: Kernel::Nearest,
            })]
        );
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let result = Pipeline::from_settings(&settings(&["blur.sigma=2"]));
        assert!(matches!(result, Err(ConvertError::UnknownOperation(op)) if op == "blur"));
    }

    #[test]
    fn pipeline_runs_on_mock_backend() {
        let backend = MockBackend::with_dimensions(vec![(100, 80)]);
        let pipeline = Pipeline::from_settings(&settings(&[
            "resize.scale=0.5",
            "save.quality=70",
            "save.strip=true",
        ]))
        .unwrap();
        let image = imaging::init_image_as(&backend, b"mock", ImageType::Png).unwrap();

        let (_, bytes) = pipeline
            .run(&backend, image, ImageType::Webp, &ExportConfig::default())
            .unwrap();
        assert_eq!(bytes, b"webp");

        let ops = backend.get_operations();
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Save {
                format: ImageType::Webp,
                quality: 70,
                strip: true,
                ..
            })
        ));
        assert!(
            ops.iter()
                .any(|op| matches!(op, RecordedOp::Resize { width: 50, height: 40, .. }))
        );
    }

    #[test]
    fn identify_and_convert_file() {
        let tmp = TempDir::new().unwrap();
        let input = write_test_image(tmp.path(), "in.png", 40, 30);
        let backend = RustBackend::new();

        let info = identify_file(&backend, &input).unwrap();
        assert_eq!(
            info,
            ImageInfo {
                format: ImageType::Png,
                width: 40,
                height: 30,
                bands: 3,
                has_alpha: false,
            }
        );

        let output = tmp.path().join("nested/out.jpg");
        let pipeline = Pipeline::from_settings(&settings(&["resize.scale=0.5"])).unwrap();
        let info = convert_file(&backend, &input, &output, &pipeline, &ExportConfig::default())
            .unwrap();
        assert_eq!((info.width, info.height), (20, 15));
        assert_eq!(info.format, ImageType::Jpeg);

        let written = identify_file(&backend, &output).unwrap();
        assert_eq!(written.format, ImageType::Jpeg);
        assert_eq!((written.width, written.height), (20, 15));
    }

    #[test]
    fn convert_rejects_unknown_output_extension() {
        let tmp = TempDir::new().unwrap();
        let input = write_test_image(tmp.path(), "in.png", 4, 4);
        let result = convert_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.bmp"),
            &Pipeline::from_settings(&[]).unwrap(),
            &ExportConfig::default(),
        );
        assert!(matches!(result, Err(ConvertError::UnknownOutputFormat(_))));
    }

    #[test]
    fn batch_mirrors_tree_and_collects_failures() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        write_test_image(&src, "a.png", 8, 8);
        write_test_image(&src.join("sub"), "b.jpg", 8, 8);
        std::fs::write(src.join("broken.png"), b"not an image").unwrap();
        std::fs::write(src.join("notes.txt"), b"skip me").unwrap();

        let out = tmp.path().join("out");
        let report = batch_convert(
            &RustBackend::new(),
            &src,
            &out,
            ImageType::Png,
            &Pipeline::from_settings(&[]).unwrap(),
            &ExportConfig::default(),
        )
        .unwrap();

        assert_eq!(report.converted.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(out.join("a.png").exists());
        assert!(out.join("sub/b.png").exists());
        assert!(!out.join("notes.png").exists());
    }
}
