//! CLI definitions for desk-nav.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "desk-nav",
    version,
    about = "Desk navigation and permission index CLI",
    infer_subcommands = true,
    after_help = "Examples:\n  desk-nav slug \"Sales Order\"\n  desk-nav route --module Accounts --link-type Report --link-to \"Profit and Loss\"\n  desk-nav index --snapshot ./permissions.json\n  desk-nav login --user jane@site\n  desk-nav refresh"
)]
pub struct Cli {
    /// Show debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Config file (defaults to desk-nav.toml in the current directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Where the session cookies are kept between runs.
    #[arg(long, global = true, default_value = ".desk-nav/cookies.json")]
    pub cookie_file: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the slug for each name.
    Slug {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Resolve one sidebar link to a route and href.
    Route {
        /// Module that contains the link.
        #[arg(long)]
        module: String,
        #[command(flatten)]
        link: LinkArgs,
        /// Print the route as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Build the slug index from a snapshot file, or from the server.
    Index {
        /// Permission snapshot JSON file (offline).
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Print the index as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Resolve a module sidebar (JSON array of links) against the index.
    Sidebar {
        #[arg(long)]
        module: String,
        /// Sidebar links JSON file.
        #[arg(long)]
        links: PathBuf,
        /// Permission snapshot JSON file (offline).
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Log in and load the permission index.
    Login {
        #[arg(long, short)]
        user: String,
        /// Password (falls back to DESK_NAV_PASSWORD).
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the session user and profile.
    Whoami,
    /// Fetch the permission snapshot for the current session.
    Refresh {
        #[arg(long)]
        json: bool,
    },
    /// Log out and drop the session.
    Logout,
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Workspace link target.
    #[arg(long, conflicts_with_all = ["link_type", "link_to"])]
    pub workspace: Option<String>,
    /// Link kind (DocType, Page, Report, Dashboard).
    #[arg(long, requires = "link_to")]
    pub link_type: Option<String>,
    /// Link target name.
    #[arg(long)]
    pub link_to: Option<String>,
}
