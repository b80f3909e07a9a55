use clap::{CommandFactory, Parser};
use dtrules::cli::args::Cli;
use dtrules::cli::commands::execute_command;
use dtrules::cli::output;
use dtrules::exitcode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let cli = Cli::parse();

    if cli.info {
        if let Some(a) = Cli::command().get_author() {
            println!("AUTHOR: {}", a)
        }
        if let Some(v) = Cli::command().get_version() {
            println!("VERSION: {}", v)
        }
        if cli.command.is_none() {
            std::process::exit(exitcode::OK);
        }
    }

    setup_logging(cli.debug);

    if let Err(e) = execute_command(&cli) {
        output::error(&e);
        std::process::exit(e.exit_code());
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // stdout carries the rules; all diagnostics go to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtrules::util::testing;
    use tracing::info;

    #[ctor::ctor]
    fn init() {
        testing::init_test_setup();
    }

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
        info!("Debug mode: info");
    }

    #[test]
    fn given_rules_args_when_parsing_then_collects_inline_names() {
        let cli = Cli::try_parse_from(["dtrules", "-d", "-d", "rules", "t.dot", "-n", "age,income", "--strict"])
            .unwrap();
        assert_eq!(cli.debug, 2);
        match cli.command {
            Some(dtrules::cli::Commands::Rules { features, strict, .. }) => {
                assert_eq!(features.names, Some(vec!["age".to_string(), "income".to_string()]));
                assert!(strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn given_both_feature_options_when_parsing_then_rejected() {
        let result = Cli::try_parse_from(["dtrules", "tree", "t.dot", "-f", "f.txt", "-n", "age"]);
        assert!(result.is_err());
    }
}
