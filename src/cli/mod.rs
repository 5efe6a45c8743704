use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clipscout",
    about = "Clipscout - Find the moments of a video worth your time",
    version,
    long_about = "A CLI tool that downloads the audio of a video (YouTube, Twitter/X, direct media URLs, or local files), analyzes it with AssemblyAI for topics and sentiment, and ranks the segments against your preferences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// AssemblyAI API key (overrides the config file)
    #[arg(long, global = true, env = "ASSEMBLYAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a video and rank its segments against your preferences
    Recommend {
        /// URL or file path to analyze (YouTube, Twitter, direct media, or local audio/video files)
        #[arg(value_name = "URL_OR_FILE")]
        url: String,

        /// Comma-separated topics of interest, e.g. "AI, startups"
        #[arg(short, long, value_name = "LIST")]
        topics: Option<String>,

        /// Preferred sentiment: positive, negative, or neutral
        #[arg(short, long, default_value = "neutral")]
        sentiment: String,

        /// Show only the top COUNT recommendations
        #[arg(short = 'n', long, value_name = "COUNT")]
        limit: Option<usize>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Save the extracted audio file
        #[arg(long)]
        save_audio: bool,

        /// Ignore cached analyses and re-run the remote analysis
        #[arg(long)]
        no_cache: bool,
    },

    /// Analyze a video and show all segments in timeline order
    Analyze {
        /// URL or file path to analyze
        #[arg(value_name = "URL_OR_FILE")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Save the extracted audio file
        #[arg(long)]
        save_audio: bool,

        /// Ignore cached analyses and re-run the remote analysis
        #[arg(long)]
        no_cache: bool,
    },

    /// Show or locate the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON with scores and timestamps
    Json,
    /// Markdown table
    Markdown,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
