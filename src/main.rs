use clap::{Parser, Subcommand};
use imgfit::config::{self, ConfigOverrides};
use imgfit::imaging::OutputFormat;
use imgfit::pipeline::{self, PipelineConfig};
use imgfit::{batch, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings shared by every processing command. Each one overrides the
/// matching key from the config file.
#[derive(clap::Args, Clone)]
struct OverrideArgs {
    /// Target width in pixels [config: output.width]
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Target height in pixels [config: output.height]
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Output format: webp, png, jpg or jpeg [config: output.format]
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    /// Size ceiling per image in KB [config: output.max_size_kb]
    #[arg(long, global = true)]
    max_size_kb: Option<u64>,

    /// Watermark image [config: logo.path]
    #[arg(long, global = true)]
    logo: Option<PathBuf>,

    /// Watermark opacity, 0-100 [config: logo.opacity]
    #[arg(long, global = true)]
    opacity: Option<u8>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            format: args.format,
            max_size_kb: args.max_size_kb,
            logo: args.logo,
            opacity: args.opacity,
        }
    }
}

#[derive(Parser)]
#[command(name = "imgfit")]
#[command(version)]
#[command(about = "Resize, watermark, and size-cap images")]
#[command(long_about = "\
Resize, watermark, and size-cap images

Every image is resized to exactly WIDTH x HEIGHT, optionally overlaid with a
centered watermark, and encoded with the highest quality that fits under the
size ceiling (quality 95 down to 10 in steps of 5).

Settings come from imgfit.toml in the working directory (if present), and
command-line flags override the file.

Examples:

  imgfit single photo.jpg --out-dir out/
  imgfit --format jpg --max-size-kb 50 batch photos.7z --output small.zip
  imgfit --logo brand.png --opacity 30 batch shoot.zip --report report.json

Run 'imgfit gen-config' to generate a documented imgfit.toml.")]
struct Cli {
    /// Config file [default: imgfit.toml, skipped if missing]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    /// Log debug details (per-attempt encoder sizes, watermark failures)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one image into OUT_DIR/processed_<name>.<ext>
    Single {
        /// Image to process (png, jpg, jpeg, webp)
        input: PathBuf,

        /// Directory for the processed image
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Process every image inside a .zip or .7z archive into one .zip
    Batch {
        /// Archive to process
        archive: PathBuf,

        /// Output archive
        #[arg(long, default_value = batch::DEFAULT_OUTPUT_NAME)]
        output: PathBuf,

        /// Also write a JSON report of every entry's outcome
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a stock imgfit.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_pipeline_config(cli: &Cli) -> Result<PipelineConfig, config::ConfigError> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_FILE), false),
    };
    let overrides = ConfigOverrides::from(cli.overrides.clone());
    let run_config = config::load_config(&path, required, &overrides)?;
    PipelineConfig::from_run_config(&run_config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Single { input, out_dir } => {
            let pipeline_config = load_pipeline_config(&cli)?;
            let (processed, written) = pipeline::process_file(input, out_dir, &pipeline_config)?;
            output::print_single_output(input, &written, &processed, &pipeline_config);
        }
        Command::Batch {
            archive,
            output: output_path,
            report,
        } => {
            let pipeline_config = load_pipeline_config(&cli)?;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::process_archive(archive, output_path, &pipeline_config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let batch_report = result?;

            output::print_batch_summary(&batch_report, output_path);
            if let Some(report_path) = report {
                batch::write_report(&batch_report, report_path)?;
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
