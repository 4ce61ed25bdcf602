use clap::value_parser;
use clap::{Arg, ArgAction, Command};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;
use tracing::debug;

use nfstructure::config::Settings;
use nfstructure::formatting::Identity;
use nfstructure::language::Dialect;
use nfstructure::parsing;
use nfstructure::rendering::{self, Terminal};

mod output;
mod problem;

#[derive(Eq, Debug, PartialEq)]
enum Output {
    Native,
    Json,
    Report,
}

fn command() -> Command {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    Command::new("nfstructure")
        .version(VERSION)
        .propagate_version(true)
        .author("Andrew Cowie")
        .about("Extract the structure of Nextflow pipelines.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug output in the log."),
        )
        .subcommand(
            Command::new("check")
                .about("Check that the structure of the given script can be extracted")
                .arg(
                    Arg::new("dsl")
                        .long("dsl")
                        .value_parser(value_parser!(Dialect))
                        .action(ArgAction::Set)
                        .help("Treat the script as DSL1 or DSL2 rather than detecting which."),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .action(ArgAction::Set)
                        .help("Settings file to use instead of nfstructure.toml."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file containing the Nextflow script you want to check."),
                ),
        )
        .subcommand(
            Command::new("outline")
                .about("Show the processes, workflows, and executors of the given script")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(["native", "json", "report"])
                        .default_value("native")
                        .action(ArgAction::Set)
                        .help("Which kind of output to produce."),
                )
                .arg(
                    Arg::new("raw-control-chars")
                        .short('R')
                        .long("raw-control-chars")
                        .action(ArgAction::SetTrue)
                        .help("Emit ANSI escape codes for syntax highlighting even if output is redirected to a pipe or file."),
                )
                .arg(
                    Arg::new("dsl")
                        .long("dsl")
                        .value_parser(value_parser!(Dialect))
                        .action(ArgAction::Set)
                        .help("Treat the script as DSL1 or DSL2 rather than detecting which."),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .action(ArgAction::Set)
                        .help("Settings file to use instead of nfstructure.toml."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file containing the Nextflow script you want to outline."),
                ),
        )
}

fn main() {
    let matches = command().get_matches();

    let level = if matches.get_flag("debug") {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    debug!("Starting nfstructure");

    match matches.subcommand() {
        Some(("check", submatches)) => {
            let filename = filename_from(submatches);
            let settings = settings_from(submatches);

            let content = load(filename);

            match parsing::parse_with_settings(&content, &settings) {
                Ok(document) => {
                    debug!(
                        "Extracted {} executors",
                        document
                            .units()
                            .iter()
                            .map(|(_, executors)| executors.len())
                            .sum::<usize>()
                    );
                }
                Err(error) => {
                    eprintln!(
                        "{}",
                        problem::full_extraction_error(&error, filename, &content, &Terminal)
                    );
                    std::process::exit(1);
                }
            }
        }
        Some(("outline", submatches)) => {
            let filename = filename_from(submatches);
            let settings = settings_from(submatches);

            let mode = match submatches
                .get_one::<String>("output")
                .map(String::as_str)
            {
                Some("json") => Output::Json,
                Some("report") => Output::Report,
                _ => Output::Native,
            };
            debug!(?mode);

            let raw_output = submatches.get_flag("raw-control-chars");

            let content = load(filename);

            let document = match parsing::parse_with_settings(&content, &settings) {
                Ok(document) => document,
                Err(error) => {
                    eprintln!(
                        "{}",
                        problem::concise_extraction_error(&error, filename, &content, &Terminal)
                    );
                    std::process::exit(1);
                }
            };

            let result = match mode {
                Output::Native => {
                    if raw_output || std::io::stdout().is_terminal() {
                        Ok(rendering::render(&Terminal, &document))
                    } else {
                        Ok(rendering::render(&Identity, &document))
                    }
                }
                Output::Json => output::via_json(&document).map_err(|error| error.to_string()),
                Output::Report => {
                    output::via_report(filename, &document).map_err(|error| error.to_string())
                }
            };

            match result {
                Ok(text) => print!("{}", text),
                Err(error) => {
                    eprintln!("{}: {}", "error".bright_red(), error);
                    std::process::exit(1);
                }
            }
        }
        Some(_) => {
            println!("No valid subcommand was used")
        }
        None => {
            println!("usage: nfstructure [COMMAND] ...");
            println!("Try '--help' for more information.");
        }
    }
}

fn filename_from(submatches: &clap::ArgMatches) -> &Path {
    match submatches.get_one::<String>("filename") {
        Some(filename) => Path::new(filename),
        None => {
            eprintln!("{}: a filename is required", "error".bright_red());
            std::process::exit(2);
        }
    }
}

/// Settings from the configuration file, with `--dsl` taking precedence.
fn settings_from(submatches: &clap::ArgMatches) -> Settings {
    let path = submatches
        .get_one::<String>("config")
        .map(Path::new);

    let mut settings = match Settings::discover(path) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("{}", problem::concise_config_error(&error));
            std::process::exit(1);
        }
    };

    if let Some(dialect) = submatches.get_one::<Dialect>("dsl") {
        settings.dialect = Some(*dialect);
    }

    settings
}

fn load(filename: &Path) -> String {
    match parsing::load(filename) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("{}", problem::concise_loading_error(&error));
            std::process::exit(1);
        }
    }
}
