// Command line arguments
use clap::{ArgAction, Parser};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::settings::PlayerSettings;

/// Plays sound files named on input lines of the form "<volume> <path>"
///
/// Reads commands from the given files in order, or from stdin when none
/// are given, until the exit token or the end of input.
#[derive(Parser, Debug)]
#[command(name = "soundcue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files to read commands from ("-" for stdin)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Settings file path (JSON)
    #[arg(short, long, value_name = "PATH", env = "SOUNDCUE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Number of distinct sounds kept loaded
    #[arg(short, long, value_name = "N", env = "SOUNDCUE_CACHE_CAPACITY")]
    pub capacity: Option<NonZeroUsize>,

    /// Output device name (see --list-devices)
    #[arg(short, long, value_name = "NAME")]
    pub device: Option<String>,

    /// Maximum number of sounds mixed at once
    #[arg(long, value_name = "N")]
    pub max_voices: Option<NonZeroUsize>,

    /// Line that stops reading input
    #[arg(long, value_name = "TOKEN")]
    pub exit_token: Option<String>,

    /// Let playing sounds finish before exiting
    #[arg(long)]
    pub drain: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    pub print_settings: bool,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Cli {
    /// Override settings file values with anything given on the command line
    pub fn apply_to(&self, settings: &mut PlayerSettings) {
        if let Some(capacity) = self.capacity {
            settings.cache.capacity = capacity.get();
        }
        if let Some(ref device) = self.device {
            settings.output.device = Some(device.clone());
        }
        if let Some(max_voices) = self.max_voices {
            settings.output.max_voices = max_voices.get();
        }
        if let Some(ref token) = self.exit_token {
            settings.commands.exit_token = token.clone();
        }
        if self.drain {
            settings.output.drain_on_exit = true;
        }
    }
}
