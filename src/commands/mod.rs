// Command stream module
// Turns "<volume> <path>" lines into playback requests for the sound player

pub mod parser;
pub mod runner;

pub use parser::{parse_line, IgnoreReason, ParsedLine, PlayRequest};
pub use runner::{CommandLoop, Dispatch, LoopOutcome, LoopSummary};
