use canal_losses::calendar::Month;
use canal_losses::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Seepage losses and decade volumes of the Rudaki irrigation canals
#[derive(Parser, Debug)]
#[command(name = "canal-losses", version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Route every decade of the season down the canal chain
    Table {
        /// April-June flow table CSV; bundled Table 16 when omitted
        #[arg(long)]
        part1: Option<PathBuf>,

        /// July-October flow table CSV; bundled Table 16 when omitted
        #[arg(long)]
        part2: Option<PathBuf>,

        /// Engine parameters (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file; defaults to hydrology_table.<ext>
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive loss metrics and status for channel records
    Channels {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "channel_metrics.csv")]
        output: PathBuf,
    },

    /// Print headline figures for a set of channel records
    Overview {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Export the computed values handed to the analysis service
    Summary {
        /// Months to include
        #[arg(short, long, value_delimiter = ',', default_values = ["aug", "sep", "oct"])]
        months: Vec<Month>,

        /// Engine parameters (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output JSON file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn get_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_summary_months() {
        let args = Args::parse_from(["canal-losses", "summary", "--months", "jul,aug"]);
        match args.command {
            Command::Summary { months, .. } => assert_eq!(months, vec![Month::Jul, Month::Aug]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn table_defaults() {
        let args = Args::parse_from(["canal-losses", "-v", "table"]);
        assert_eq!(args.verbose, 1);
        match args.command {
            Command::Table { format, part1, .. } => {
                assert_eq!(format, OutputFormat::Csv);
                assert!(part1.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
