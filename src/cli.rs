//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fleetmon - dashboard client for phone-bank fleet monitoring
///
/// Authenticate against the fleet backend, fetch the live dashboard,
/// and manage phone banks, phones, and scheduled tasks from the
/// terminal.
///
/// Examples:
///   fleetmon login admin
///   fleetmon dashboard --search "north"
///   fleetmon phone-banks list
///   fleetmon tasks execute 7
///   fleetmon --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the fleet monitoring backend
    ///
    /// Can also be set via FLEETMON_API_URL or .fleetmon.toml.
    #[arg(long, value_name = "URL", env = "FLEETMON_API_URL")]
    pub base_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fleetmon.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the stored session credentials
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (table, json)
    #[arg(long, default_value = "table", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .fleetmon.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Status policy selector for the dashboard command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    /// Own phone banks only; can report Healthy
    Simple,
    /// Own plus children's phone banks; never reports Healthy
    Recursive,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate and store a session token
    Login {
        /// Username (usually an email address)
        username: String,
        /// Password; prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Discard the stored session
    Logout,
    /// Show the currently stored session user
    Whoami,
    /// Fetch and render the fleet dashboard
    Dashboard {
        /// Filter locations by name or phone-bank IP
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
        /// Status policy override (default from config)
        #[arg(long, value_name = "POLICY")]
        policy: Option<PolicyArg>,
    },
    /// Institution lookups
    Institutions {
        #[command(subcommand)]
        action: InstitutionAction,
    },
    /// Manage phone banks
    PhoneBanks {
        #[command(subcommand)]
        action: CrudAction,
    },
    /// Manage phones
    Phones {
        #[command(subcommand)]
        action: CrudAction,
    },
    /// Manage scheduled automation tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// List notifications
    Notifications,
}

#[derive(Subcommand, Debug, Clone)]
pub enum InstitutionAction {
    /// Fetch one institution by id
    Get { id: u64 },
}

/// Standard create/read/update/delete actions shared by the
/// pass-through resource families.
#[derive(Subcommand, Debug, Clone)]
pub enum CrudAction {
    /// List all records
    List,
    /// Fetch one record by id
    Get { id: u64 },
    /// Create a record from a JSON body
    Create {
        /// Raw JSON body, passed through to the backend
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Update a record from a JSON body
    Update {
        id: u64,
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a record by id
    Delete { id: u64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// List all tasks
    List,
    /// Fetch one task by id
    Get { id: u64 },
    /// Create a task from a JSON body
    Create {
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Update a task from a JSON body
    Update {
        id: u64,
        #[arg(long, value_name = "JSON")]
        data: String,
    },
    /// Delete a task by id
    Delete { id: u64 },
    /// Enable or disable a task
    Toggle { id: u64 },
    /// Run a task immediately
    Execute { id: u64 },
    /// Fetch a task's execution logs
    Logs { id: u64 },
    /// Attach a media file to a task
    UploadMedia {
        id: u64,
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// Set a task's profile image
    UploadProfileImage {
        id: u64,
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("No command given. Try `fleetmon dashboard` or --help".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: Some(Command::Dashboard {
                search: None,
                policy: None,
            }),
            base_url: None,
            config: None,
            credentials: None,
            timeout: None,
            format: OutputFormat::Table,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_base_url() {
        let mut args = make_args();
        args.base_url = Some("ftp://fleet.example.com".to_string());
        assert!(args.validate().is_err());

        args.base_url = Some("https://fleet.example.com".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_dashboard_command() {
        let args = Args::try_parse_from([
            "fleetmon",
            "dashboard",
            "--search",
            "north",
            "--policy",
            "recursive",
        ])
        .unwrap();

        match args.command {
            Some(Command::Dashboard { search, policy }) => {
                assert_eq!(search.as_deref(), Some("north"));
                assert_eq!(policy, Some(PolicyArg::Recursive));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_task_upload_commands() {
        let args = Args::try_parse_from([
            "fleetmon",
            "tasks",
            "upload-media",
            "7",
            "--file",
            "clips/greeting.mp4",
        ])
        .unwrap();

        match args.command {
            Some(Command::Tasks {
                action: TaskAction::UploadMedia { id, file },
            }) => {
                assert_eq!(id, 7);
                assert_eq!(file, PathBuf::from("clips/greeting.mp4"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from([
            "fleetmon",
            "tasks",
            "upload-profile-image",
            "7",
            "--file",
            "avatar.png",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Tasks {
                action: TaskAction::UploadProfileImage { .. },
            })
        ));
    }

    #[test]
    fn test_parse_crud_command() {
        let args = Args::try_parse_from([
            "fleetmon",
            "phone-banks",
            "update",
            "4",
            "--data",
            r#"{"ip": "10.0.0.9"}"#,
        ])
        .unwrap();

        match args.command {
            Some(Command::PhoneBanks {
                action: CrudAction::Update { id, data },
            }) => {
                assert_eq!(id, 4);
                assert!(data.contains("10.0.0.9"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
