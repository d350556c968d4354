use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use ghostclick::player::{Corner, EnigoActuator, PlaybackConfig, PlaybackOutcome, Player, SafetyZone};
use ghostclick::recorder::{InputHook, Recorder, StdinHook};
use ghostclick::script::{self, Script, ScriptEditor};

/// Ghostclick CLI
#[derive(Debug, Parser)]
#[command(
    name = ghostclick::PKG_NAME,
    version = ghostclick::PKG_VERSION,
    about = "Record pointer clicks and moves, then replay them"
)]
struct Args {
    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a saved script
    Play(PlayArgs),
    /// Record pointer activity into a new script
    Record(RecordArgs),
    /// List the steps of a saved script
    Show {
        script: PathBuf,
    },
    /// Print the JSON Schema of the script document and exit
    Schema,
}

#[derive(Debug, clap::Args)]
struct PlayArgs {
    script: PathBuf,

    /// Log each step instead of moving the pointer
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Divide every recorded delay by this factor
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Seconds to wait between two passes over the steps
    #[arg(long = "repeat-delay", default_value_t = 0.0)]
    repeat_delay: f64,

    /// Override the script's repeat count (0 repeats until Ctrl+C)
    #[arg(long)]
    repeat: Option<u32>,

    /// Do not abort when the pointer reaches a safety corner
    #[arg(long = "no-failsafe")]
    no_failsafe: bool,

    /// Corners that abort playback (repeatable)
    #[arg(long = "failsafe-corner", value_enum, default_values_t = [Corner::TopLeft])]
    failsafe_corners: Vec<Corner>,

    /// Extra pixels around each safety corner
    #[arg(long = "failsafe-margin", default_value_t = 0)]
    failsafe_margin: i32,
}

#[derive(Debug, clap::Args)]
struct RecordArgs {
    /// Where to save the script (".ghostclick" is appended when missing)
    out: PathBuf,

    /// Also record pointer movements
    #[arg(long)]
    movements: bool,

    /// Read newline-delimited JSON raw events from stdin instead of the OS hook
    #[arg(long = "from-stdin")]
    from_stdin: bool,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long = "duration-secs")]
    duration_secs: Option<f64>,

    /// Name stored in the script
    #[arg(long, default_value = "Untitled")]
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.log_level.as_deref().map(ghostclick::parse_level) {
        Some(Some(level)) => ghostclick::init_tracing_with_level(level),
        Some(None) => {
            ghostclick::init_tracing();
            warn!("Unknown --log-level value; falling back to RUST_LOG/info");
        }
        None => ghostclick::init_tracing(),
    }
    debug!(version = ghostclick::PKG_VERSION, "Starting Ghostclick");

    match args.command {
        Command::Play(play_args) => play(play_args).await,
        Command::Record(record_args) => record(record_args).await,
        Command::Show { script } => show(&script).await,
        Command::Schema => {
            script::write_schema_to_writer(std::io::stdout())?;
            println!();
            Ok(())
        }
    }
}

async fn play(args: PlayArgs) -> anyhow::Result<()> {
    let mut script = script::load_from_path_async(&args.script).await?;
    if let Some(repeat) = args.repeat {
        script.repeat_count = repeat;
    }
    info!(
        script = %args.script.display(),
        steps = script.len(),
        repeat = script.repeat_count,
        dry_run = args.dry_run,
        "Loaded script"
    );

    let safety = if args.no_failsafe {
        SafetyZone::disabled()
    } else {
        SafetyZone {
            enabled: true,
            margin: args.failsafe_margin,
            corners: args.failsafe_corners,
        }
    };
    let config = PlaybackConfig::default()
        .with_speed(args.speed)
        .with_inter_iteration_delay(args.repeat_delay)
        .with_safety(safety);
    let player = Player::new(Box::new(EnigoActuator::new()), config)
        .context("Invalid playback settings")?;

    let labels: Vec<String> = script.steps.iter().map(|a| a.describe()).collect();
    let total = labels.len();
    player.on_step_change(move |i| {
        if let Some(label) = labels.get(i) {
            println!("[{}/{}] {}", i + 1, total, label);
        }
    });
    player.on_error(|message| eprintln!("Playback error: {message}"));

    let Some(mut handle) = player.start(script, args.dry_run) else {
        bail!("playback is already running");
    };

    let outcome = tokio::select! {
        joined = &mut handle => joined.context("Playback task panicked")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping playback");
            player.stop();
            handle.await.context("Playback task panicked")?
        }
    };

    match outcome {
        PlaybackOutcome::Completed => {
            println!("Playback finished.");
            Ok(())
        }
        PlaybackOutcome::Stopped => {
            println!("Playback stopped.");
            Ok(())
        }
        PlaybackOutcome::Failed(err) => Err(err).context("Playback aborted"),
    }
}

fn input_hook(from_stdin: bool) -> anyhow::Result<Box<dyn InputHook>> {
    if from_stdin {
        return Ok(Box::new(StdinHook::new()));
    }
    #[cfg(feature = "rdev")]
    {
        Ok(Box::new(ghostclick::recorder::RdevHook::new()))
    }
    #[cfg(not(feature = "rdev"))]
    {
        Err(ghostclick::Error::InputHook(
            "no OS input hook in this build; rebuild with `--features rdev` or pass --from-stdin"
                .into(),
        )
        .into())
    }
}

async fn record(args: RecordArgs) -> anyhow::Result<()> {
    let recorder = Recorder::new(input_hook(args.from_stdin)?);
    recorder.on_action_captured(|action| println!("+ {}", action.describe()));
    recorder
        .start(args.movements)
        .context("Failed to start recording")?;

    match args.duration_secs {
        Some(secs) => {
            let limit = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("Invalid --duration-secs value {secs}"))?;
            println!("Recording for {secs}s (Ctrl+C stops early)...");
            tokio::select! {
                _ = tokio::time::sleep(limit) => {}
                _ = tokio::signal::ctrl_c() => {}
                _ = recorder.wait_input_closed() => info!("Input ended"),
            }
        }
        None => {
            println!("Recording... press Ctrl+C to stop.");
            tokio::select! {
                signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl+C")?,
                _ = recorder.wait_input_closed() => info!("Input ended"),
            }
        }
    }

    let captured = recorder.stop().await;
    if captured.is_empty() {
        warn!("Nothing was recorded");
    }

    let mut editor = ScriptEditor::new(Script::new(args.name));
    editor.append_steps(captured);
    let saved = script::save_to_path(editor.script(), &args.out)?;
    println!("Saved {} step(s) to {}", editor.steps().len(), saved.display());
    Ok(())
}

async fn show(path: &Path) -> anyhow::Result<()> {
    let script = script::load_from_path_async(path).await?;
    let repeat = if script.is_infinite() {
        "forever".to_string()
    } else {
        format!("{}x", script.repeat_count)
    };
    println!("{} (v{}, repeat {repeat})", script.name, script.version);
    for (i, action) in script.steps.iter().enumerate() {
        println!("{:>3}. {}", i + 1, action.describe());
    }
    Ok(())
}
