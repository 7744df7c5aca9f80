use clap::Parser;
use log::LevelFilter;
use tether_utils::{ok, AnyResult};

fn main() -> AnyResult {
    let cli = tether_cli::Cli::parse_from(wild::args());

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(level)
        .init();

    tether_cli::run(cli)?;
    ok()
}
