mod admin;
mod export;
mod project;

use clap::{Arg, ArgMatches, Command};

use beacon::{config, Config, Database};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cmd().get_matches();

    // Without an explicit path the default config file is used if present,
    // defaults otherwise.
    let config: Config = match matches.get_one::<String>("config") {
        Some(path) => config::load_from(path)?,
        None => config::load().unwrap_or_default(),
    };

    match matches.subcommand() {
        Some(("serve", _)) => serve(config).await?,
        Some(("admin", m)) => admin::run(m, &open_db(&config)?)?,
        Some(("project", m)) => project::run(m, &config, &open_db(&config)?).await?,
        Some(("export", m)) => export::run(m, &open_db(&config)?)?,
        Some(("regen-key", _)) => {
            beacon::util::regen_cookie_key(&open_db(&config)?)?;
            println!("Cookie key regenerated, existing admin sessions were invalidated");
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

fn open_db(config: &Config) -> anyhow::Result<Database> {
    Ok(Database::open(&config.db)?)
}

/// Runs the web server until it fails or ctrl-c is received.
async fn serve(config: Config) -> anyhow::Result<()> {
    tokio::select! {
        result = beacon::axum::start(beacon::axum::Router::new(), config) => result?,
        _ = tokio::signal::ctrl_c() => println!("Shutting down..."),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("beacon")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .about("Content site for non-profit projects, blog and messages.")
        .subcommand(Command::new("serve").about("Starts the web server").display_order(1))
        .subcommand(admin::cmd())
        .subcommand(project::cmd())
        .subcommand(export::cmd())
        .subcommand(
            Command::new("regen-key")
                .about("Regenerates the key encrypting session cookies")
                .display_order(80),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
}

/// Required positional argument, guaranteed present by clap.
pub(crate) fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}
