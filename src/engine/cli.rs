//! Hotpatch CLI Module
//! Command-line interface for running startup update checks locally

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::platform::PrivilegeFlags;

#[derive(Parser, Debug)]
#[command(name = "hotpatch")]
#[command(author = "Hotpatch Team")]
#[command(version)]
#[command(about = "Startup update orchestration and hotfix content sync", long_about = None)]
pub struct Cli {
    /// Directory holding hotpatch.config.json (defaults to current directory)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default hotpatch.config.json
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Run the full startup update sequence against a local mirror
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Only check whether a hotfix is available
        #[arg(long)]
        hotfix_only: bool,

        /// Run the check this many times in a row
        #[arg(long, default_value = "1")]
        repeat: u32,

        /// Privilege bits the simulated store reports
        #[arg(long = "privilege", value_enum)]
        privileges: Vec<PrivilegeArg>,

        /// Simulate a platform identity service that logs in this user
        #[arg(long)]
        login: Option<String>,

        /// Asset loads pending when the preload wait starts
        #[arg(long, default_value = "0")]
        pending_loads: u32,
    },

    /// Show which mirror files would be applied, without downloading
    Diff {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Directory acting as the remote hotfix manifest
    #[arg(short, long)]
    pub source: PathBuf,

    /// Where downloaded files are cached (defaults to the platform cache dir)
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Where config deltas are merged to
    #[arg(long, default_value = "config")]
    pub config_out: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PrivilegeArg {
    SystemUpdateRequired,
    PatchAvailable,
    UserNotLoggedIn,
    UserNotFound,
    GenericFailure,
}

impl PrivilegeArg {
    pub fn flag(self) -> PrivilegeFlags {
        match self {
            PrivilegeArg::SystemUpdateRequired => PrivilegeFlags::SYSTEM_UPDATE_REQUIRED,
            PrivilegeArg::PatchAvailable => PrivilegeFlags::PATCH_AVAILABLE,
            PrivilegeArg::UserNotLoggedIn => PrivilegeFlags::USER_NOT_LOGGED_IN,
            PrivilegeArg::UserNotFound => PrivilegeFlags::USER_NOT_FOUND,
            PrivilegeArg::GenericFailure => PrivilegeFlags::GENERIC_FAILURE,
        }
    }

    pub fn combine(args: &[PrivilegeArg]) -> PrivilegeFlags {
        args.iter().fold(PrivilegeFlags::NONE, |acc, arg| acc | arg.flag())
    }
}

impl Cli {
    /// Config directory, defaulting to the current directory
    pub fn get_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
