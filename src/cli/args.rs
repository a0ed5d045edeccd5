//! Command line argument parsing for the hearth CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::query::Fuzziness;
use crate::ranking::SortMode;
use crate::suggest::SuggestField;

/// Hearth - apartment search and discovery
#[derive(Parser, Debug, Clone)]
#[command(name = "hearth")]
#[command(about = "Search, filter and get suggestions over apartment listings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HearthArgs {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Apartment records, one JSON object per line
    #[arg(long, value_name = "APARTMENTS_JSONL", env = "HEARTH_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, value_name = "CONFIG_JSON", env = "HEARTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl HearthArgs {
    /// Effective verbosity: 0 quiet, 1 normal, then more detail.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Full-text search with optional filters
    Search(SearchArgs),

    /// Structured filtering, newest first by default
    Filter(FilterArgs),

    /// Complete a partially typed word
    Autocomplete(AutocompleteArgs),

    /// Suggest a corrected query
    Spellcheck(SpellcheckArgs),

    /// Show index statistics
    Stats,
}

/// Paging and ordering shared by search and filter.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Results to skip
    #[arg(short, long, default_value_t = 0)]
    pub skip: usize,

    /// Page size (0 uses the configured default)
    #[arg(short, long, default_value_t = 0)]
    pub limit: usize,

    /// Do not move featured listings to the top
    #[arg(long)]
    pub no_featured_first: bool,
}

/// Arguments for searching
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query text; omit to browse every listing
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Filter object: inline JSON or @path/to/filter.json
    #[arg(long, value_name = "FILTER")]
    pub filter: Option<String>,

    /// Sort order
    #[arg(long, default_value = "relevance", value_parser = SortMode::parse)]
    pub sort_by: SortMode,

    /// Typo tolerance: auto, none, 1 or 2
    #[arg(long, default_value = "auto")]
    pub fuzziness: Fuzziness,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for filtering
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Filter object: inline JSON or @path/to/filter.json
    #[arg(value_name = "FILTER")]
    pub filter: String,

    /// Sort order
    #[arg(long, default_value = "date_desc", value_parser = SortMode::parse)]
    pub sort_by: SortMode,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Arguments for autocomplete
#[derive(Args, Debug, Clone)]
pub struct AutocompleteArgs {
    /// Prefix typed so far
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    /// Field to complete from: title, location, keywords or all
    #[arg(long, default_value = "all", value_parser = SuggestField::parse)]
    pub field: SuggestField,

    /// Maximum suggestions (0 uses the configured default)
    #[arg(short, long, default_value_t = 0)]
    pub limit: usize,

    /// Titles, locations and keywords as separate lists
    #[arg(long, conflicts_with = "field")]
    pub grouped: bool,
}

/// Arguments for spellcheck
#[derive(Args, Debug, Clone)]
pub struct SpellcheckArgs {
    /// Query to correct
    #[arg(value_name = "QUERY")]
    pub query: String,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Human,
    /// JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_command() {
        let args = HearthArgs::try_parse_from([
            "hearth",
            "--data",
            "apartments.jsonl",
            "search",
            "zamalek",
            "--sort-by",
            "price_asc",
            "--fuzziness",
            "1",
            "--limit",
            "5",
        ])
        .unwrap();

        assert_eq!(args.data, Some(PathBuf::from("apartments.jsonl")));
        if let Command::Search(search) = args.command {
            assert_eq!(search.query.as_deref(), Some("zamalek"));
            assert_eq!(search.sort_by, SortMode::PriceAsc);
            assert_eq!(search.fuzziness, Fuzziness::Edits(1));
            assert_eq!(search.page.limit, 5);
            assert!(!search.page.no_featured_first);
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_filter_defaults_to_newest_first() {
        let args = HearthArgs::try_parse_from(["hearth", "filter", r#"{"min_price": 500}"#]).unwrap();
        if let Command::Filter(filter) = args.command {
            assert_eq!(filter.sort_by, SortMode::DateDesc);
            assert_eq!(filter.filter, r#"{"min_price": 500}"#);
        } else {
            panic!("Expected Filter command");
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(HearthArgs::try_parse_from(["hearth", "search", "x", "--sort-by", "cheapest"]).is_err());
        assert!(HearthArgs::try_parse_from(["hearth", "search", "x", "--fuzziness", "7"]).is_err());
        assert!(HearthArgs::try_parse_from(["hearth", "autocomplete", "ca", "--field", "rent"]).is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = HearthArgs::try_parse_from(["hearth", "stats"]).unwrap();
        assert_eq!(args.verbosity(), 1);
        assert_eq!(args.log_level(), "warn");

        let args = HearthArgs::try_parse_from(["hearth", "-vv", "stats"]).unwrap();
        assert_eq!(args.log_level(), "debug");

        let args = HearthArgs::try_parse_from(["hearth", "stats", "--quiet"]).unwrap();
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.log_level(), "error");
    }

    #[test]
    fn test_output_format() {
        let args = HearthArgs::try_parse_from(["hearth", "--format", "json", "stats"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }
}
