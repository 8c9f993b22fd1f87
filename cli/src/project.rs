use anyhow::Result;
use clap::{arg, ArgMatches, Command};
use uuid::Uuid;

use beacon::client::{self, RetryPolicy};
use beacon::persist::{self, ProjectStore};
use beacon::{Config, Database, ListCache, Project};

use crate::required;

pub fn cmd() -> Command {
    Command::new("project")
        .subcommand_required(true)
        .display_order(20)
        .about("Inspect and manage projects")
        .subcommand(Command::new("list").about("Lists all projects, including unpublished"))
        .subcommand(
            Command::new("show")
                .about("Prints the project as json")
                .arg(arg!(<project> "Project slug or id")),
        )
        .subcommand(
            Command::new("render")
                .about("Prints the rendered content of the project")
                .arg(arg!(<project> "Project slug or id")),
        )
        .subcommand(
            Command::new("import")
                .about("Creates or updates a project from a yaml file")
                .arg(arg!(<source> "Path or http(s) url of the yaml file")),
        )
        .subcommand(
            Command::new("rm")
                .about("Deletes a project")
                .arg(arg!(<project> "Project slug or id")),
        )
}

fn find(db: &Database, key: &str) -> Result<Project> {
    let project = match Uuid::parse_str(key) {
        Ok(id) => db.get_project(id)?,
        Err(_) => db.find_project_by_slug(key)?,
    };
    project.ok_or_else(|| anyhow::anyhow!("project not found: {key}"))
}

/// Reads a local file, or fetches it when given an http(s) url.
async fn read_source(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(client::fetch_text(source, &RetryPolicy::default()).await?)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

pub async fn run(matches: &ArgMatches, config: &Config, db: &Database) -> Result<()> {
    let cache = ListCache::from_config(&config.cache);
    match matches.subcommand() {
        Some(("list", _)) => {
            for p in persist::list_all(db)? {
                let visibility = if p.published { "" } else { " (unpublished)" };
                println!("{}\t{}\t{}{}", p.id, p.slug, p.status, visibility);
            }
        }
        Some(("show", m)) => {
            let project = find(db, required(m, "project"))?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        Some(("render", m)) => {
            let project = find(db, required(m, "project"))?;
            println!("{}", beacon::render::render_html(&project.content)?);
        }
        Some(("import", m)) => {
            let text = read_source(required(m, "source")).await?;
            let mut project: Project = serde_yaml::from_str(&text)?;
            // Importing over an existing project keeps its identity.
            if let Some(existing) = db.find_project_by_slug(&beacon::slug::slugify(&project.title))? {
                project.id = existing.id;
            }
            let project = persist::save_project(db, &cache, project, None)?;
            println!("Saved {} (version {})", project.slug, project.version);
        }
        Some(("rm", m)) => {
            let project = find(db, required(m, "project"))?;
            persist::delete_project(db, &cache, project.id)?;
            println!("Deleted {}", project.slug);
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}
