use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

const USAGE_LONG: &str = r#"
This program runs the rfsleuth analysis pipeline on a raw IQ recording: it detects the modulation parameters, demodulates the capture into messages, and infers protocol field boundaries when at least two messages are present.

Supported input formats, selected by file extension:

  .complex, .cfile   interleaved float32 I/Q pairs, little endian
  .cs8               interleaved signed 8-bit I/Q pairs
  .cu8               interleaved unsigned 8-bit I/Q pairs
  .cs16              interleaved signed 16-bit I/Q pairs, little endian

Detection is sample-rate agnostic; --rate only affects reported timing. Pass --modulation or --noise when you already know them to skip the corresponding detection stages.
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Input recording
    pub file: String,

    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print only the analysis report
    #[arg(short, long)]
    pub quiet: bool,

    /// Sampling rate of the recording (Hz)
    #[arg(short, long, default_value_t = 1_000_000.0)]
    pub rate: f64,

    /// Known modulation: ASK, FSK, or PSK
    #[arg(short, long)]
    pub modulation: Option<String>,

    /// Known noise floor (linear magnitude)
    #[arg(short, long)]
    pub noise: Option<f32>,

    /// Emit the result as JSON instead of a text report
    #[arg(long)]
    pub json: bool,
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        Args::command().debug_assert();
    }
}
