//! Module tasked with generating mock data to populate the application.

use serde_json::json;

use crate::admin::{self, Admin, NewAdmin, Role};
use crate::block::{Block, BlockId, Payload};
use crate::cache::ListCache;
use crate::persist::{self, ProjectStore};
use crate::{Config, Database, ErrorKind, Project, Result};

pub const MOCK_ADMIN_EMAIL: &str = "dev@beacon.local";
pub const MOCK_ADMIN_PASSWORD: &str = "dev-password";

/// Generates and saves various mocking data in the database.
pub fn generate(config: &Config, db: &Database) -> Result<()> {
    admin(config, db)?;
    project(config, db)?;
    Ok(())
}

pub fn admin(config: &Config, db: &Database) -> Result<Admin> {
    if let Some(existing) = admin::find_by_email(db, MOCK_ADMIN_EMAIL)? {
        if !config.dev.mock_regen {
            return Ok(existing);
        }
        db.remove(&existing)?;
    }
    admin::create(
        db,
        NewAdmin {
            email: MOCK_ADMIN_EMAIL.to_string(),
            name: "Dev Admin".to_string(),
            password: MOCK_ADMIN_PASSWORD.to_string(),
            role: Role::SuperAdmin,
        },
    )
}

fn block(tag: &str, content: serde_json::Value) -> Result<Block> {
    let payload = Payload::from_value(tag, content)?;
    if payload.kind().is_none() {
        return Err(ErrorKind::Other(format!("mock block `{tag}` is not a known kind")).into());
    }
    Ok(Block::new(BlockId::generate(), payload))
}

/// Sample project exercising a good share of the block kinds.
pub fn project(config: &Config, db: &Database) -> Result<Project> {
    let cache = ListCache::from_config(&config.cache);
    let title = "Aide Aux Écoles";
    if let Some(existing) = db.find_project_by_slug(&crate::slug::slugify(title))? {
        if !config.dev.mock_regen {
            return Ok(existing);
        }
        persist::delete_project(db, &cache, existing.id)?;
    }

    let mut project = Project::new(title);
    project.excerpt = "Rebuilding rural classrooms and training teachers.".to_string();
    project.categories.insert("education".to_string());
    project.location = "Kaolack, Senegal".to_string();
    project.start_date = "2021".to_string();
    project.people_helped = "1400".to_string();
    project.goals = vec![
        "Renovate 12 classrooms".to_string(),
        "Train 40 teachers".to_string(),
    ];

    for b in [
        block(
            "text",
            json!({ "heading": "Bienvenue", "text": "Every child deserves a classroom.\n\nWe build them together with the villages." }),
        )?,
        block(
            "stats",
            json!({ "title": "Key figures", "stats": [
                { "label": "Schools", "value": "12" },
                { "label": "Pupils", "value": "1400" }
            ] }),
        )?,
        block(
            "timeline",
            json!({ "title": "History", "events": [
                { "year": "2021", "title": "First school", "description": "Opened in Ndiaffate." },
                { "year": "2023", "title": "Teacher training", "description": "" }
            ] }),
        )?,
        block(
            "quote",
            json!({ "text": "The school changed our village.", "author": "Awa, teacher" }),
        )?,
        block(
            "faq",
            json!({ "title": "Questions", "questions": [
                { "question": "How can I help?", "answer": "Sponsor a classroom or volunteer." }
            ] }),
        )?,
        block(
            "cta",
            json!({ "title": "Support us", "description": "Every donation counts.", "buttonText": "Donate", "buttonUrl": "/contact" }),
        )?,
    ] {
        project.content.push(b);
    }

    persist::save_project(db, &cache, project, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_data_is_idempotent() -> Result<()> {
        let db = Database::temporary()?;
        let config = Config::default();
        generate(&config, &db)?;
        generate(&config, &db)?;
        assert_eq!(admin::list(&db)?.len(), 1);
        let projects = db.list_projects()?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].content.len(), 6);
        assert!(crate::render::render(&projects[0].content)?.len() == 6);
        Ok(())
    }
}
