use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use clap::{arg, Arg, ArgMatches, Command};

use beacon::admin::{self, NewAdmin};
use beacon::{Database, Role};

use crate::required;

pub fn cmd() -> Command {
    Command::new("admin")
        .subcommand_required(true)
        .display_order(10)
        .about("Inspect and manage admin accounts")
        .subcommand(
            Command::new("add")
                .arg_required_else_help(true)
                .about("Adds new admin account")
                .arg(arg!(<email> "Admin email"))
                .arg(arg!([password] "Admin password, prompted for if not provided"))
                .arg(arg!(--name [name] "Display name"))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .short('r')
                        .default_value("content_manager")
                        .value_parser(["super_admin", "content_manager", "messages_manager"]),
                ),
        )
        .subcommand(Command::new("list").about("Lists admin accounts"))
        .subcommand(
            Command::new("role")
                .about("Changes the role of an admin")
                .arg(arg!(<email> "Admin email"))
                .arg(
                    Arg::new("role")
                        .required(true)
                        .value_parser(["super_admin", "content_manager", "messages_manager"]),
                ),
        )
        .subcommand(
            Command::new("unlock")
                .about("Lifts a lockout caused by failed logins")
                .arg(arg!(<email> "Admin email")),
        )
        .subcommand(
            Command::new("rm")
                .about("Removes an admin account")
                .arg(arg!(<email> "Admin email")),
        )
}

fn find(db: &Database, email: &str) -> Result<beacon::Admin> {
    admin::find_by_email(db, email)?.ok_or_else(|| anyhow::anyhow!("no admin with email {email}"))
}

pub fn run(matches: &ArgMatches, db: &Database) -> Result<()> {
    match matches.subcommand() {
        Some(("add", m)) => {
            let email = required(m, "email").to_string();
            let password = match m.get_one::<String>("password") {
                Some(password) => password.clone(),
                None => rpassword::prompt_password("Password: ")?,
            };
            let role = Role::from_str(required(m, "role"))?;
            let name = m.get_one::<String>("name").cloned().unwrap_or_default();
            let admin = admin::create(
                db,
                NewAdmin {
                    email,
                    name,
                    password,
                    role,
                },
            )?;
            println!("Added admin {} ({}), id: {}", admin.email, admin.role, admin.id);
        }
        Some(("list", _)) => {
            let admins = admin::list(db)?;
            println!("Found {} admin(s):", admins.len());
            for admin in admins {
                let locked = match admin.locked_until {
                    Some(until) if admin.is_locked(Utc::now()) => format!(" locked until {until}"),
                    _ => String::new(),
                };
                println!("{}\t{}\t{}{}", admin.email, admin.role, admin.name, locked);
            }
        }
        Some(("role", m)) => {
            let found = find(db, required(m, "email"))?;
            let role = Role::from_str(required(m, "role"))?;
            let admin = admin::set_role(db, found.id, role)?;
            println!("{} is now {}", admin.email, admin.role);
        }
        Some(("unlock", m)) => {
            let found = find(db, required(m, "email"))?;
            admin::unlock(db, found.id)?;
            println!("Unlocked {}", found.email);
        }
        Some(("rm", m)) => {
            let found = find(db, required(m, "email"))?;
            admin::delete(db, found.id)?;
            println!("Removed {}", found.email);
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}
