//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// JourneyDash - patient-journey analytics queue
///
/// Track analysis requests, simulate their progress, ask the analytics
/// assistant about the current analysis, and browse the patient-journey
/// rule tables.
///
/// Examples:
///   journeydash list
///   journeydash add "Breast Cancer" market-access --analysis-name "Payer Mix"
///   journeydash simulate --duration-ms 3000
///   journeydash chat "Which payers impose prior authorization?"
///   journeydash knowledge AML --query-type treatment_phases
///   journeydash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .journeydash.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted dashboard state
    #[arg(long, value_name = "DIR", env = "JOURNEYDASH_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Keep state in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Gemini API key for the chat assistant
    #[arg(long, value_name = "KEY", env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Assistant request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .journeydash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List queued analyses, most recent first
    List,

    /// Queue a new analysis and make it the current session
    Add {
        /// Indication key (e.g. "Breast Cancer")
        indication: String,

        /// Analysis type key (e.g. market-access, persistency)
        analysis_type: String,

        /// Display name for the indication (defaults to the key)
        #[arg(long)]
        indication_name: Option<String>,

        /// Display name for the analysis (defaults to the type)
        #[arg(long)]
        analysis_name: Option<String>,
    },

    /// Set the status (and optionally progress) of an analysis
    Status {
        id: String,

        /// pending, in-progress, running, completed, failed
        status: String,

        /// Progress percentage (0-100)
        #[arg(long)]
        progress: Option<u8>,
    },

    /// Make an analysis the current session (no id clears it)
    Select { id: Option<String> },

    /// Show one analysis (defaults to the current session)
    Show { id: Option<String> },

    /// Remove an analysis
    Remove { id: String },

    /// Remove every analysis
    Clear,

    /// Show or change the sidebar preference
    Sidebar {
        #[arg(value_enum)]
        state: Option<SidebarState>,
    },

    /// Simulate progress of an analysis (defaults to the current session)
    Simulate {
        id: Option<String>,

        /// Total simulated run time
        #[arg(long, default_value = "5000", value_name = "MS")]
        duration_ms: u64,
    },

    /// Ask the analytics assistant about the current analysis
    Chat {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Print patient-journey rules for an indication
    Knowledge {
        indication: String,

        /// patient_funnel, drug_classifications, progression_rules,
        /// treatment_phases, backbone_drugs (default: everything)
        #[arg(long, value_name = "TYPE")]
        query_type: Option<String>,

        /// Free-text question; prints the prompt context it would add
        #[arg(long, value_name = "TEXT", conflicts_with = "query_type")]
        query: Option<String>,
    },
}

/// Sidebar preference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SidebarState {
    Collapse,
    Expand,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A subcommand is required (try --help)".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(Command::Status {
            progress: Some(progress),
            ..
        }) = &self.command
        {
            if *progress > 100 {
                return Err("Progress must be between 0 and 100".to_string());
            }
        }

        if let Some(ref dir) = self.state_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!("State path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("journeydash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_add() {
        let args = parse(&["add", "Breast Cancer", "market-access", "--analysis-name", "Payer Mix"]);
        assert_eq!(
            args.command,
            Some(Command::Add {
                indication: "Breast Cancer".to_string(),
                analysis_type: "market-access".to_string(),
                indication_name: None,
                analysis_name: Some("Payer Mix".to_string()),
            })
        );
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_chat_joins_words() {
        let args = parse(&["chat", "what", "about", "payers?"]);
        match args.command {
            Some(Command::Chat { message }) => assert_eq!(message.join(" "), "what about payers?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["list", "--ephemeral", "-v"]);
        assert!(args.ephemeral);
        assert!(args.verbose);
    }

    #[test]
    fn test_validation_requires_command() {
        let args = parse(&[]);
        assert!(args.validate().is_err());

        let args = parse(&["--init-config"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["list", "--verbose", "--quiet"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_progress_range() {
        let args = parse(&["status", "demo_1", "running", "--progress", "150"]);
        assert!(args.validate().is_err());

        let args = parse(&["status", "demo_1", "running", "--progress", "50"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_knowledge_query_conflicts() {
        let result = Args::try_parse_from([
            "journeydash",
            "knowledge",
            "AML",
            "--query-type",
            "patient_funnel",
            "--query",
            "drugs",
        ]);
        assert!(result.is_err());
    }
}
