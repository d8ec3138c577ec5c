mod args;

use std::{io::BufRead, process::ExitCode};

use clap::Parser;
use eyre::Context;
use taglog::{Builder, Caller, EnvConfig, FixedTagProvider, FormatterConfig, Logger, Value};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
};

use crate::args::{Args, SinkKind};

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Err(err) => {
            let root = err.root_cause();

            eprint!("\x1b[31m");
            eprintln!("Error: {}", err);
            eprintln!();
            eprintln!("Caused by:");
            eprint!("  {}", root);
            eprintln!("\x1b[0m");
            ExitCode::from(1)
        }
        Ok(_) => ExitCode::from(0),
    }
}

fn diagnostics_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        5_u8..=u8::MAX => LevelFilter::TRACE,
    }
}

fn setup_tracing(args: &Args) {
    let uses_tracing_sink = args.sink_kinds().contains(&SinkKind::Tracing);
    if args.verbose == 0 && !uses_tracing_sink {
        return;
    }

    let sink_filter = if uses_tracing_sink {
        LevelFilter::TRACE
    } else {
        LevelFilter::OFF
    };
    let targets = Targets::new()
        .with_target("taglog::sink", sink_filter)
        .with_target("taglog", diagnostics_filter(args.verbose));

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(targets);

    // Another subscriber already owning the process is fine.
    let _ = subscriber.try_init();
}

fn build_logger(args: &Args) -> eyre::Result<Logger> {
    let env = EnvConfig::load();
    let formatter_config = FormatterConfig {
        datetime_format: args.timestamp.clone(),
        color: args.color.or(env.color).unwrap_or_default(),
    };

    let mut builder = Builder::new()
        .with_env(&env)
        .with_formatter_config(formatter_config)
        .with_tag_provider(FixedTagProvider(args.tag.clone()));

    if let Some(level) = args.min_level {
        builder = builder.with_level(level);
    }
    if args.auto_format {
        builder = builder.with_auto_format(true);
    }
    if let Some(max) = args.max_line {
        builder = builder.with_max_line_length(max);
    }

    for kind in args.sink_kinds() {
        builder = match kind {
            SinkKind::Console => builder.with_console_sink(),
            SinkKind::Stderr => builder.with_stderr_sink(),
            SinkKind::Tracing => builder.with_tracing_sink(),
            SinkKind::File => match &args.file {
                Some(path) => builder.with_file_sink(path),
                None => eyre::bail!("--sink file needs a log file, pass one with --file"),
            },
        };
    }

    builder.build().context("Failed setting up the logger")
}

fn run(args: Args) -> eyre::Result<()> {
    setup_tracing(&args);
    let logger = build_logger(&args)?;
    let values = args.values();

    tracing::debug!(target: "taglog", priority = %args.priority, tag = %args.tag, "logger ready");

    match &args.message {
        Some(message) => {
            logger.log(
                args.priority,
                Caller::new(module_path!()),
                &Value::from(message),
                &values,
            );
        }
        None => {
            for line in std::io::stdin().lock().lines() {
                let line = line.context("Failed reading stdin")?;
                logger.log(
                    args.priority,
                    Caller::new(module_path!()),
                    &Value::from(line),
                    &values,
                );
            }
        }
    }

    logger.flush();
    Ok(())
}
