use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including the git hash for non-release builds.
/// Format for releases: "v0.3.0"
/// Format for dev builds: "v0.3.0 (dev abc1234)"
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{} (dev {})", VERSION, GIT_HASH)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "modeldata",
    bin_name = "modeldata",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Manage JSON record collections stored as documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the collection documents (overrides config)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of the default modeldata.toml
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Treat a collection with no document yet as empty
    #[arg(long, global = true, help_heading = "Options")]
    pub create_missing: bool,

    /// Print the operation status as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a collection and list its records
    #[command(alias = "ls")]
    List {
        /// Collection name, e.g. "congregations"
        collection: String,
    },

    /// Append a record to a collection
    Add {
        collection: String,

        /// The record, as a JSON object
        record: String,
    },

    /// Replace the record at an index
    Update {
        collection: String,

        /// Zero-based position of the record
        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// The replacement record, as a JSON object
        record: String,
    },

    /// Remove the record at an index
    #[command(alias = "rm")]
    Delete {
        collection: String,

        /// Zero-based position of the record
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// Show the effective configuration
    Config {
        /// Print a commented modeldata.toml template instead
        #[arg(long)]
        template: bool,
    },
}
