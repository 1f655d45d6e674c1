// Command loop: reads lines, plays valid commands, skips everything else
use std::io::{self, BufRead};
use tracing::{debug, warn};

use super::parser::{parse_line, IgnoreReason, ParsedLine, PlayRequest};
use crate::audio::{AudioEngine, SoundPlayer};

/// How a run over one input ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The exit token was read; no further input should be processed
    Exited,
    EndOfInput,
}

/// What happened to a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Played,
    Exit,
    Ignored(IgnoreReason),
    MissingFile,
    LoadFailed,
}

/// Line counts accumulated across every input the loop has read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub lines: u64,
    pub played: u64,
    pub ignored: u64,
    pub missing: u64,
    pub failed: u64,
}

/// Feeds parsed commands to a sound player
///
/// Malformed lines, missing files and load failures are logged and skipped;
/// only I/O errors on the input itself stop the loop.
pub struct CommandLoop<'p, E: AudioEngine> {
    player: &'p mut SoundPlayer<E>,
    exit_token: String,
    summary: LoopSummary,
}

impl<'p, E: AudioEngine> CommandLoop<'p, E> {
    pub fn new(player: &'p mut SoundPlayer<E>, exit_token: impl Into<String>) -> Self {
        Self {
            player,
            exit_token: exit_token.into(),
            summary: LoopSummary::default(),
        }
    }

    /// Process lines from `reader` until the exit token or end of input
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> io::Result<LoopOutcome> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(LoopOutcome::EndOfInput);
            }
            if self.handle_line(&line) == Dispatch::Exit {
                debug!(line = self.summary.lines, "exit requested");
                return Ok(LoopOutcome::Exited);
            }
        }
    }

    /// Classify and act on one raw input line
    pub fn handle_line(&mut self, raw: &[u8]) -> Dispatch {
        self.summary.lines += 1;

        let parsed = match std::str::from_utf8(raw) {
            Ok(line) => parse_line(line, &self.exit_token),
            Err(_) => ParsedLine::Ignored(IgnoreReason::NotUtf8),
        };

        match parsed {
            ParsedLine::Exit => Dispatch::Exit,
            ParsedLine::Ignored(reason) => {
                self.summary.ignored += 1;
                debug!(line = self.summary.lines, %reason, "ignoring line");
                Dispatch::Ignored(reason)
            }
            ParsedLine::Play(request) => self.dispatch(request),
        }
    }

    fn dispatch(&mut self, request: PlayRequest) -> Dispatch {
        if !request.path.is_file() {
            self.summary.missing += 1;
            debug!(path = %request.path.display(), "no such file, skipping");
            return Dispatch::MissingFile;
        }

        match self.player.play(&request.path, request.volume) {
            Ok(()) => {
                self.summary.played += 1;
                Dispatch::Played
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!(error = %e, "could not play sound");
                Dispatch::LoadFailed
            }
        }
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }
}
