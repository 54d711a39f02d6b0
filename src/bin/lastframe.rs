use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use lastframe::{
    ClipMetadata, FfmpegLogLevel, PixelFormat, PrepareError, PrepareOptions, PreparedArtifacts,
    ProgressCallback, ProgressInfo, configuration,
};
use log::LevelFilter;
use serde_json::{Value, json};

const CLI_AFTER_HELP: &str = "Examples:\n  lastframe prepare input_clip.mp4\n  lastframe prepare takes/shot_04.mp4 --frame-out out/last.png --epsilon-ms 40 --progress\n  lastframe inspect input_clip.mp4 --json\n  lastframe completions zsh > _lastframe";

/// Exit status for any failure other than a missing input.
const EXIT_FAILURE: u8 = 1;

/// Exit status when the input video does not exist.
const EXIT_INPUT_NOT_FOUND: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "lastframe",
    version,
    about = "Extract a clip's last frame and write continuation prompt templates",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while preparing.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the last frame and write both templates.
    #[command(
        about = "Extract the last frame and write both templates",
        after_help = "Examples:\n  lastframe prepare input_clip.mp4\n  lastframe prepare clip.mov --frame-out clip_end.jpg --json"
    )]
    Prepare {
        /// Input video path.
        #[arg(default_value = configuration::DEFAULT_INPUT)]
        input: PathBuf,
        /// Output path for the extracted frame (format from extension).
        #[arg(long, default_value = configuration::DEFAULT_FRAME_PATH)]
        frame_out: PathBuf,
        /// Output path for the clip analysis template.
        #[arg(long, default_value = configuration::DEFAULT_ANALYSIS_PATH)]
        analysis_out: PathBuf,
        /// Output path for the generation prompt template.
        #[arg(long, default_value = configuration::DEFAULT_PROMPT_PATH)]
        prompt_out: PathBuf,
        /// Milliseconds before the end at which to sample.
        #[arg(long, default_value_t = 50)]
        epsilon_ms: u64,
        /// Pixel format of the saved frame (rgb8, rgba8, gray8).
        #[arg(long, default_value = "rgb8")]
        pixel_format: String,
        /// Print a machine-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Print clip metadata without writing anything.
    #[command(about = "Print clip metadata", visible_alias = "probe")]
    Inspect {
        /// Input video path.
        #[arg(default_value = configuration::DEFAULT_INPUT)]
        input: PathBuf,
        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Default `env_logger` level; `RUST_LOG` still overrides it.
fn log_level(global: &GlobalOptions) -> LevelFilter {
    if global.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn init_logging(global: &GlobalOptions) {
    env_logger::Builder::new()
        .filter_level(log_level(global))
        .parse_default_env()
        .format_target(false)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        lastframe::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:30.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        self.bar.set_message(info.stage.to_string());
        if info.current == info.total {
            self.bar.finish_with_message("done");
        }
    }
}

fn metadata_json(metadata: &ClipMetadata) -> Value {
    json!({
        "format": metadata.format,
        "duration_seconds": metadata.duration.as_secs_f64(),
        "fps": metadata.frames_per_second,
        "width": metadata.width,
        "height": metadata.height,
        "codec": metadata.codec,
        "audio": metadata.audio.as_ref().map(|audio| json!({
            "sample_rate": audio.sample_rate,
            "channels": audio.channels,
            "codec": audio.codec,
        })),
    })
}

fn print_artifacts(
    input: &Path,
    artifacts: &PreparedArtifacts,
    as_json: bool,
) -> serde_json::Result<()> {
    if as_json {
        let payload = json!({
            "input": input.display().to_string(),
            "metadata": metadata_json(&artifacts.metadata),
            "sampled_at_seconds": artifacts.sampled_at.as_secs_f64(),
            "frame": {
                "path": artifacts.frame_path.display().to_string(),
                "width": artifacts.frame_width,
                "height": artifacts.frame_height,
            },
            "analysis": artifacts.analysis_path.display().to_string(),
            "prompt": artifacts.prompt_path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Loaded video: {}", input.display());
        println!("{}", artifacts.metadata);
        println!("Saved last frame to {}", artifacts.frame_path.display());
        println!("Created {}", artifacts.analysis_path.display());
        println!("Created {}", artifacts.prompt_path.display());
        println!(
            "{} Open {} and edit {} and {}",
            "done.".green().bold(),
            artifacts.frame_path.display(),
            artifacts.analysis_path.display(),
            artifacts.prompt_path.display(),
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Prepare {
            input,
            frame_out,
            analysis_out,
            prompt_out,
            epsilon_ms,
            pixel_format,
            json,
        } => {
            let pixel_format = PixelFormat::from_name(&pixel_format)
                .ok_or(format!("unsupported --pixel-format: {pixel_format}"))?;

            let mut options = PrepareOptions::new(&input)
                .with_frame_path(frame_out)
                .with_analysis_path(analysis_out)
                .with_prompt_path(prompt_out)
                .with_epsilon(Duration::from_millis(epsilon_ms))
                .with_pixel_format(pixel_format);
            if cli.global.progress {
                options = options.with_progress(Arc::new(TerminalProgress::new()?));
            }

            let artifacts = lastframe::prepare(&options)?;
            print_artifacts(&input, &artifacts, json)?;
        }
        Commands::Inspect { input, json } => {
            let metadata = lastframe::inspect(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata_json(&metadata))?);
            } else {
                println!("Loaded video: {}", input.display());
                println!("{metadata}");
                println!("Codec: {} [{}]", metadata.codec, metadata.format);
                if let Some(audio) = &metadata.audio {
                    println!(
                        "Audio: {} Hz, {} ch [{}]",
                        audio.sample_rate, audio.channels, audio.codec,
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "lastframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Process exit status for a failed run.
fn exit_status(error: &(dyn std::error::Error + 'static)) -> u8 {
    let not_found = error
        .downcast_ref::<PrepareError>()
        .is_some_and(PrepareError::is_input_not_found);
    if not_found {
        EXIT_INPUT_NOT_FOUND
    } else {
        EXIT_FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::from(exit_status(error.as_ref()))
        }
    }
}
