// soundcue entry point
// Reads "<volume> <path>" lines from files or stdin and plays them

use anyhow::Context;
use clap::Parser;
use soundcue::audio::output::output_device_names;
use soundcue::cli::Cli;
use soundcue::commands::{CommandLoop, LoopOutcome};
use soundcue::settings::PlayerSettings;
use soundcue::{AudioEngine, SoundPlayer, SystemAudioEngine};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins; otherwise 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("soundcue=warn"),
        1 => EnvFilter::new("soundcue=info"),
        _ => EnvFilter::new("soundcue=debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_devices {
        for name in output_device_names()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut settings = match cli.settings {
        Some(ref path) => PlayerSettings::load(path)?,
        None => PlayerSettings::default(),
    };
    cli.apply_to(&mut settings);
    settings.validate()?;

    if cli.print_settings {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let engine =
        SystemAudioEngine::open(&settings.output).context("failed to open audio output")?;
    let mut player = SoundPlayer::with_capacity(engine, settings.cache_capacity()?);

    let summary = {
        let mut commands = CommandLoop::new(&mut player, settings.commands.exit_token.clone());
        read_inputs(&cli.inputs, &mut commands)?;
        commands.summary()
    };

    let stats = player.cache().stats();
    info!(
        lines = summary.lines,
        played = summary.played,
        ignored = summary.ignored,
        missing = summary.missing,
        failed = summary.failed,
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        evictions = stats.evictions,
        "input finished"
    );

    if settings.output.drain_on_exit && !player.engine().drain(settings.output.drain_timeout()) {
        warn!(
            timeout_ms = settings.output.drain_timeout_ms,
            "sounds still playing at exit"
        );
    }

    Ok(())
}

/// Run the command loop over each input in turn; the exit token stops them all
fn read_inputs<E: AudioEngine>(
    inputs: &[PathBuf],
    commands: &mut CommandLoop<'_, E>,
) -> anyhow::Result<()> {
    if inputs.is_empty() {
        commands
            .run(io::stdin().lock())
            .context("failed to read commands from stdin")?;
        return Ok(());
    }

    for input in inputs {
        let outcome = if input.as_os_str() == "-" {
            commands
                .run(io::stdin().lock())
                .context("failed to read commands from stdin")?
        } else {
            let file = File::open(input)
                .with_context(|| format!("failed to open input {}", input.display()))?;
            commands
                .run(BufReader::new(file))
                .with_context(|| format!("failed to read commands from {}", input.display()))?
        };

        if outcome == LoopOutcome::Exited {
            break;
        }
    }

    Ok(())
}
