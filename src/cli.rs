use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kvault",
    about = "Personal knowledge vault with semantic search",
    version
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(global = true, long, short)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of formatted text
    #[arg(global = true, long)]
    pub json: bool,

    /// Profile to operate on (defaults to $KVAULT_PROFILE or "default")
    #[arg(global = true, long, short)]
    pub profile: Option<String>,

    /// Data directory holding all profiles (defaults to $KVAULT_DATA_DIR)
    #[arg(global = true, long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add content under a topic
    Add {
        /// Topic or title of the content
        topic: String,

        /// Content text (reads stdin when neither --content nor --file is given)
        #[arg(long, short, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a text file
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Where the content came from (URL, PDF name, ...)
        #[arg(long, short, default_value = "manual")]
        source: String,
    },

    /// Semantic search across a profile
    Search {
        /// Search query
        query: String,

        /// Number of results (defaults to $KVAULT_TOP_K or 5)
        #[arg(long, short = 'k')]
        top_k: Option<usize>,

        /// Treat the query as a topic and return exact topic matches only
        #[arg(long)]
        exact: bool,
    },

    /// Show every record stored under a topic
    Show {
        /// Topic (exact, case-sensitive)
        topic: String,
    },

    /// List topics
    Topics {
        /// Include the number of records per topic
        #[arg(long)]
        counts: bool,

        /// Group topics by their "Prefix:" part
        #[arg(long, conflicts_with = "counts")]
        groups: bool,
    },

    /// Delete all records of a topic (rebuilds the index)
    Delete {
        /// Topic (exact, case-sensitive)
        topic: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Answer a question from stored knowledge
    Ask {
        /// The question
        question: String,
    },

    /// Records in the order they were added
    Timeline,

    /// Search results grouped by topic
    Themes {
        /// Research topic or question
        query: String,

        /// Number of results to group
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },

    /// List profiles, or create one
    Profiles {
        /// Create a new profile with this name
        #[arg(long)]
        create: Option<String>,
    },

    /// Re-embed every record and rebuild the index
    Reindex,

    /// Check snapshot consistency without modifying anything
    Check,
}
