use std::str::FromStr;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, LevelFilter};

use rfsleuth::{Analyzer, Modulation};

mod app;
mod cli;
mod decoders;

use cli::{Args, CliError};
use decoders::RawIqDecoder;

fn main() {
    match sleuthdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn sleuthdec() -> Result<(), CliError> {
    let args = Args::try_parse()?;
    log_setup(&args);

    let mut analyzer = Analyzer::new();
    analyzer.with_sample_rate(args.rate);
    if let Some(noise) = args.noise {
        analyzer.with_noise(noise);
    }
    if let Some(modulation) = &args.modulation {
        let modulation = Modulation::from_str(modulation)
            .map_err(|_| anyhow!("unknown modulation \"{modulation}\"; use ASK, FSK, or PSK"))?;
        analyzer.with_modulation(modulation);
    }

    info!("analyzing \"{}\"", args.file);
    let decoder = RawIqDecoder::new(args.rate);
    let result = analyzer
        .analyze_from_source(&decoder, &args.file)
        .with_context(|| format!("unable to analyze \"{}\"", args.file))?;

    if args.json {
        app::print_json(&result)?;
    } else {
        app::print_report(&result);
    }

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("rfsleuth", log_filter)
            .filter_module("sleuthdec", log_filter)
            .init();
    } else {
        pretty_env_logger::init();
    }
}
