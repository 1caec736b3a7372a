use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors (default)
    Warn,
    /// Informational messages
    Info,
    /// Debug messages (default for verbose)
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Target syntax for `qir render`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Sparql,
    Sql,
}

#[derive(Parser)]
#[command(name = "qir")]
#[command(about = "qir - render, analyze and rewrite QueryIR wire documents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Render config file (TOML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Explicit level wins over `--verbose`
    pub fn level_filter(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::WARN,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a statement as SPARQL text or an SQL description
    Render {
        /// Wire-format JSON file, or `-` for stdin
        input: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Sparql)]
        format: OutputFormat,

        /// Extra prefix declaration `prefix=namespace` (repeatable)
        #[arg(short = 'p', long = "prefix")]
        prefixes: Vec<String>,

        /// Omit BASE/PREFIX lines
        #[arg(long)]
        no_prologue: bool,
    },

    /// Report variables, required variables and complexity per pattern
    Analyze {
        /// Wire-format JSON file, or `-` for stdin
        input: PathBuf,
    },

    /// Apply rewrites and print the re-encoded statement
    Rewrite {
        /// Wire-format JSON file, or `-` for stdin
        input: PathBuf,

        /// Merge joins of basic graph patterns
        #[arg(long)]
        flatten: bool,

        /// Simplify property paths
        #[arg(long)]
        simplify_paths: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the statement name and its classification
    Classify {
        /// Wire-format JSON file, or `-` for stdin
        input: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_defaults() {
        let cli = Cli::try_parse_from(["qir", "render", "query.json"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::WARN);
        match cli.command {
            Commands::Render {
                input,
                format,
                prefixes,
                no_prologue,
            } => {
                assert_eq!(input, PathBuf::from("query.json"));
                assert_eq!(format, OutputFormat::Sparql);
                assert!(prefixes.is_empty());
                assert!(!no_prologue);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_parse_repeated_prefixes_and_format() {
        let cli = Cli::try_parse_from([
            "qir", "render", "-f", "sql", "-p", "ex=http://ex/", "-p", "foaf=http://f/", "-",
        ])
        .unwrap();
        let Commands::Render {
            input,
            format,
            prefixes,
            ..
        } = cli.command
        else {
            panic!("expected render");
        };
        assert_eq!(input, PathBuf::from("-"));
        assert_eq!(format, OutputFormat::Sql);
        assert_eq!(prefixes, vec!["ex=http://ex/", "foaf=http://f/"]);
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["qir", "-v", "classify", "q.json"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::DEBUG);

        let cli =
            Cli::try_parse_from(["qir", "-v", "--log-level", "trace", "analyze", "q.json"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn test_parse_rewrite_flags() {
        let cli =
            Cli::try_parse_from(["qir", "rewrite", "--flatten", "--simplify-paths", "q.json"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rewrite {
                flatten: true,
                simplify_paths: true,
                pretty: false,
                ..
            }
        ));
    }
}
