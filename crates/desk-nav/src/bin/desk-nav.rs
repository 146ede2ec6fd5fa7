//! CLI entrypoint for desk-nav.

#[path = "desk-nav/cli.rs"]
mod cli;
#[path = "desk-nav/offline.rs"]
mod offline;
#[path = "desk-nav/remote.rs"]
mod remote;
#[path = "desk-nav/style.rs"]
mod style;

use clap::Parser;
use desk_nav::config::DeskConfig;

use cli::{Cli, Command};
use remote::Remote;

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::discover(&std::env::current_dir()?)?,
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_tracing(level);

    match cli.command {
        Command::Slug { names } => {
            offline::run_slug(&names);
            Ok(())
        }
        Command::Route { module, link, json } => {
            offline::run_route(&config.routes, &module, link, json)
        }
        Command::Index {
            snapshot: Some(snapshot),
            json,
        } => offline::print_index(&offline::load_index(&snapshot)?, json),
        Command::Index {
            snapshot: None,
            json,
        } => remote::run_refresh(&Remote::open(&config, &cli.cookie_file)?, json),
        Command::Sidebar {
            module,
            links,
            snapshot: Some(snapshot),
        } => {
            let index = offline::load_index(&snapshot)?;
            let links = offline::load_links(&links)?;
            offline::print_sidebar(&config.routes, &module, &links, &index)
        }
        Command::Sidebar {
            module,
            links,
            snapshot: None,
        } => remote::run_sidebar(&Remote::open(&config, &cli.cookie_file)?, &module, &links),
        Command::Login { user, password } => {
            remote::run_login(&Remote::open(&config, &cli.cookie_file)?, &user, password)
        }
        Command::Whoami => remote::run_whoami(&Remote::open(&config, &cli.cookie_file)?),
        Command::Refresh { json } => {
            remote::run_refresh(&Remote::open(&config, &cli.cookie_file)?, json)
        }
        Command::Logout => remote::run_logout(&Remote::open(&config, &cli.cookie_file)?),
    }
}

fn init_tracing(level: &str) {
    let directive = format!("desk_nav={level}");
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match directive.parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
