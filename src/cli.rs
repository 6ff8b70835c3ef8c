use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::storage::Visibility;

#[derive(Parser, Debug)]
#[command(name = "minls")]
#[command(about = "Upload a file to MinIO, shorten the link and keep a local record", long_about = None)]
pub struct Cli {
    /// Log level: error, warn, info, debug, trace or off
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory holding data, logs and configuration (defaults to the executable's directory)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Configuration file (defaults to `<base-dir>/minls.toml`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            base_dir: self.base_dir.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file, shorten its link and copy it to the clipboard
    Upload(UploadArgs),
    /// Show recorded uploads
    List,
    /// Delete recorded uploads, log files, or both
    Clear(ClearArgs),
    /// Print the version
    Version,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Bucket to upload to
    #[arg(value_enum)]
    pub policy: Policy,
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    #[arg(value_enum)]
    pub target: ClearTarget,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Plain link, readable by anyone
    Public,
    /// Presigned link that expires
    Private,
}

impl From<Policy> for Visibility {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Public => Visibility::Public,
            Policy::Private => Visibility::Private,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    /// Ledger and logs
    All,
    /// Ledger only
    Data,
    /// Logs only
    Logs,
}

impl ClearTarget {
    pub fn includes_data(self) -> bool {
        matches!(self, ClearTarget::All | ClearTarget::Data)
    }

    pub fn includes_logs(self) -> bool {
        matches!(self, ClearTarget::All | ClearTarget::Logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let cli = Cli::parse_from(["minls", "upload", "shot.png", "private", "--log-level", "debug"]);

        assert_eq!(cli.overrides().log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.file, PathBuf::from("shot.png"));
                assert_eq!(Visibility::from(args.policy), Visibility::Private);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_clear_targets() {
        let cli = Cli::parse_from(["minls", "--base-dir", "/tmp/m", "clear", "logs"]);
        let Commands::Clear(args) = cli.command else {
            panic!("expected clear");
        };
        assert!(args.target.includes_logs());
        assert!(!args.target.includes_data());
        assert_eq!(cli.base_dir, Some(PathBuf::from("/tmp/m")));

        assert!(ClearTarget::All.includes_data() && ClearTarget::All.includes_logs());
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["minls", "upload", "a.txt", "shared"]).is_err());
        assert!(Cli::try_parse_from(["minls", "upload", "a.txt"]).is_err());
    }
}
