use clap::{Parser, Subcommand};

/// Loads, validates and summarizes U.S. presidential election results by state.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing where the data is and which years to load.
    /// Relative data directories are resolved from the directory of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) The data directory. Setting this option overrides the dataDirectory
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (default 1972) The first election year to load.
    #[clap(long, value_parser)]
    pub min_year: Option<u32>,

    /// (default 2020) The last election year to load.
    #[clap(long, value_parser)]
    pub max_year: Option<u32>,

    /// If passed as an argument, the plausibility checks on the results are only logged.
    /// The integrity checks always apply.
    #[clap(long, takes_value = false)]
    pub no_validation: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Loads all the data and reports the electoral outcome of every year.
    Validate,
    /// The national picture of one year.
    Summary {
        /// (default: the latest year) The election year.
        #[clap(long, value_parser)]
        year: Option<u32>,
        /// Show the advantages relative to the national popular vote.
        #[clap(long, takes_value = false)]
        relative: bool,
        /// A view fragment such as 'year=2000&state=FL&actualResults=1'. The --year and
        /// --relative options are applied on top of it.
        #[clap(long, value_parser)]
        view: Option<String>,
    },
    /// The history of one state over all the loaded years.
    State {
        /// The two-letter code of the state.
        #[clap(value_parser)]
        code: String,
        #[clap(long, takes_value = false)]
        relative: bool,
    },
    /// Computes the smallest sets of states that would have changed each result.
    MinVotes {
        /// (file path, 'stdout' or empty) Where to write the JSON output.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference JSON file. If provided, the output is compared to it and any
        /// difference is an error.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Writes all the aggregated years in JSON format.
    Export {
        /// (file path, 'stdout' or empty) Where to write the JSON output.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
}
