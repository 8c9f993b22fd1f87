use anyhow::{Error, Result};
use clap::{Arg, ArgMatches, Command};

use beacon::admin::{self, AdminView};
use beacon::persist::ProjectStore;
use beacon::{blog, message, Database};

pub fn cmd() -> Command {
    Command::new("export")
        .about("Export information from the database as json")
        .display_order(70)
        .arg(
            Arg::new("collection")
                .display_order(11)
                .help("Provide collection name")
                .value_parser(["projects", "posts", "messages", "admins"])
                .required(true),
        )
}

pub fn run(matches: &ArgMatches, db: &Database) -> Result<()> {
    let collection = matches
        .get_one::<String>("collection")
        .ok_or_else(|| Error::msg("collection is required"))?;

    let json = match collection.as_str() {
        "projects" => serde_json::to_string_pretty(&db.list_projects()?)?,
        "posts" => serde_json::to_string_pretty(&blog::list_all(db)?)?,
        "messages" => serde_json::to_string_pretty(&message::list(db, false)?)?,
        "admins" => {
            // Credentials never leave the database.
            let admins: Vec<AdminView> = admin::list(db)?.iter().map(AdminView::from).collect();
            serde_json::to_string_pretty(&admins)?
        }
        other => return Err(Error::msg(format!("unknown collection: {other}"))),
    };
    println!("{json}");

    Ok(())
}
