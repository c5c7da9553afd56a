use clap::{Parser, Subcommand};
use pixbridge::config::{self, StartupConfig};
use pixbridge::convert::{self, Pipeline, Setting};
use pixbridge::runtime;
use pixbridge::types::ImageType;
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Operation settings shared by `convert` and `batch`.
#[derive(clap::Args, Clone)]
struct PipelineArgs {
    /// Set an operation argument, e.g. resize.scale=0.5 or gravity.direction=north-east.
    /// Operations run in the order their first setting appears.
    #[arg(long = "set", value_name = "OP.NAME=VALUE")]
    settings: Vec<String>,
}

impl PipelineArgs {
    fn pipeline(&self) -> Result<Pipeline, convert::ConvertError> {
        let settings = self
            .settings
            .iter()
            .map(|s| s.parse::<Setting>())
            .collect::<Result<Vec<_>, _>>()?;
        Pipeline::from_settings(&settings)
    }
}

#[derive(Parser)]
#[command(name = "pixbridge")]
#[command(about = "Decode, transform and encode images")]
#[command(long_about = "\
Decode, transform and encode images

The same engine the C library exposes, driven from the command line.

Operations and their arguments:

  resize        scale, vscale, kernel (nearest|linear|cubic|lanczos2|lanczos3)
  extract_area  left, top, width, height
  gravity       direction (centre|north|east|...|north-west), width, height,
                extend (black|copy|repeat|mirror|white|background), red, green, blue
  save          quality, compression, interlace, lossless, strip

Example:

  pixbridge convert in.jpg out.webp --set resize.scale=0.5 --set save.strip=true

Run 'pixbridge gen-config' to generate a documented pixbridge.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Startup config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print format and dimensions of images as JSON
    Identify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert one image; the output extension picks the format
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Convert every image under a directory tree
    Batch {
        input: PathBuf,
        output: PathBuf,
        /// Target format (jpeg, png, webp, tiff)
        #[arg(long, default_value = "jpeg")]
        format: ImageType,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Print a stock pixbridge.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let startup_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => StartupConfig::default(),
    };
    init_thread_pool(&startup_config);
    runtime::startup(Some(startup_config))?;

    let backend = runtime::backend();
    let defaults = runtime::config().export.clone();

    match cli.command {
        Command::Identify { files } => {
            for file in files {
                let info = convert::identify_file(&backend, &file)?;
                let json = serde_json::json!({ "file": file, "image": info });
                println!("{json}");
            }
        }
        Command::Convert {
            input,
            output,
            pipeline,
        } => {
            let info = convert::convert_file(
                &backend,
                &input,
                &output,
                &pipeline.pipeline()?,
                &defaults,
            )?;
            println!(
                "{} → {} ({}x{} {})",
                input.display(),
                output.display(),
                info.width,
                info.height,
                info.format
            );
        }
        Command::Batch {
            input,
            output,
            format,
            pipeline,
        } => {
            let report = convert::batch_convert(
                &backend,
                &input,
                &output,
                format,
                &pipeline.pipeline()?,
                &defaults,
            )?;
            for (path, info) in &report.converted {
                println!("{} ({}x{})", path.display(), info.width, info.height);
            }
            for (path, error) in &report.failed {
                eprintln!("failed: {} ({error})", path.display());
            }
            println!(
                "Converted {} file(s), {} failed",
                report.converted.len(),
                report.failed.len()
            );
            if !report.failed.is_empty() {
                runtime::shutdown();
                std::process::exit(1);
            }
        }
        Command::GenConfig => {}
    }

    runtime::shutdown();
    Ok(())
}

/// Initialize the rayon thread pool from the startup config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(config: &StartupConfig) {
    let threads = config::effective_threads(config);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
