// Line classification for the command stream
use std::fmt;
use std::path::PathBuf;

/// A validated "<volume> <path>" command
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub volume: f32,
    pub path: PathBuf,
}

/// Why a line was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    MissingSeparator,
    InvalidVolume,
    NotUtf8,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty line",
            Self::MissingSeparator => "no space between volume and path",
            Self::InvalidVolume => "volume is not a number",
            Self::NotUtf8 => "line is not valid UTF-8",
        };
        f.write_str(reason)
    }
}

/// What a single input line asks for
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Play(PlayRequest),
    Exit,
    Ignored(IgnoreReason),
}

/// Classify one line of input
///
/// Surrounding whitespace is ignored. The first space splits the volume from
/// the path, so paths may contain spaces.
pub fn parse_line(line: &str, exit_token: &str) -> ParsedLine {
    let line = line.trim();
    if line == exit_token {
        return ParsedLine::Exit;
    }
    if line.is_empty() {
        return ParsedLine::Ignored(IgnoreReason::Empty);
    }

    let Some((volume, path)) = line.split_once(' ') else {
        return ParsedLine::Ignored(IgnoreReason::MissingSeparator);
    };

    let Ok(volume) = volume.parse::<f32>() else {
        return ParsedLine::Ignored(IgnoreReason::InvalidVolume);
    };

    // The line is trimmed, so whatever follows the space is non-empty
    ParsedLine::Play(PlayRequest {
        volume,
        path: PathBuf::from(path.trim()),
    })
}
