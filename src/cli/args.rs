//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Extract human-readable decision rules from decision-tree DOT dumps
#[derive(Parser, Debug)]
#[command(name = "dtrules")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (repeat for more: -d -d -d)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one decision rule per leaf
    Rules {
        /// Tree dump (DOT)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        features: FeatureArgs,

        /// Fail on split nodes with a single child instead of following it
        #[arg(long)]
        strict: bool,
    },

    /// Show the tree with box-drawing characters
    Tree {
        /// Tree dump (DOT)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        features: FeatureArgs,
    },

    /// Show node counts and depth
    Stats {
        /// Tree dump (DOT)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        features: FeatureArgs,
    },

    /// Re-serialize the tree in normalized form
    Dot {
        /// Tree dump (DOT)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        features: FeatureArgs,

        /// Write to file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where feature names come from; falls back to `features_file` from the config.
#[derive(Args, Debug, Default, Clone)]
pub struct FeatureArgs {
    /// Feature names file, one name per line
    #[arg(short, long, value_hint = ValueHint::FilePath, conflicts_with = "names")]
    pub features: Option<PathBuf>,

    /// Feature names inline, comma separated, in index order
    #[arg(short, long, value_delimiter = ',')]
    pub names: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Directory searched for a local .dtrules.toml
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,

        /// Directory for the local config (default: cwd)
        #[arg(conflicts_with = "global", value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Show config paths
    Path,
}
