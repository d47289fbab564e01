//! pagealign command-line entry point

use clap::Parser;
use pagealign_cli::commands::Commands;

/// Align page layout text with its scans and export Web Annotations
#[derive(Debug, Parser)]
#[command(name = "pagealign", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.command.execute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "pagealign",
            "extract",
            "-i",
            "iiif.csv",
            "-m",
            "data/NL_1",
            "data/NL_2",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract(args) => {
                assert!(args.merge_sections);
                assert_eq!(args.directory.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
