//! Data initialization procedures.
//!
//! Both the app config and the content directory can contain entries
//! describing items expected to exist after the application is started. This
//! module converts them into initial application state.

use std::path::Path;

use crate::admin::{self, NewAdmin};
use crate::cache::ListCache;
use crate::persist::{self, ProjectStore};
use crate::{blog, Config, Database, Project, Result};

/// Initializes database state based on entries found at configured
/// locations.
pub fn initialize(config: &Config, db: &Database) -> Result<()> {
    let cache = ListCache::from_config(&config.cache);
    admins(config, db)?;
    blog_posts(config, db, &cache)?;
    projects(config, db, &cache)?;
    Ok(())
}

/// Creates admins listed in the configuration. Existing accounts get their
/// role updated, passwords are left alone.
pub fn admins(config: &Config, db: &Database) -> Result<()> {
    for init in &config.admins {
        match admin::find_by_email(db, &init.email)? {
            Some(existing) if existing.role != init.role => {
                admin::set_role(db, existing.id, init.role)?;
            }
            Some(_) => (),
            None => {
                admin::create(
                    db,
                    NewAdmin {
                        email: init.email.clone(),
                        name: init.name.clone(),
                        password: init.password.clone(),
                        role: init.role,
                    },
                )?;
            }
        }
    }
    Ok(())
}

/// Files of the content subdirectory with one of the given extensions. A
/// missing directory yields nothing.
fn seed_files(config: &Config, subdir: &str, extensions: &[&str]) -> Result<Vec<std::path::PathBuf>> {
    let dir = Path::new(&config.init.content_dir).join(subdir);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(vec![]),
    };
    let mut files = vec![];
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Seeds blog posts from `blog/*.md`. Posts whose slug already exists are
/// skipped.
pub fn blog_posts(config: &Config, db: &Database, cache: &ListCache) -> Result<()> {
    for path in seed_files(config, "blog", &["md"])? {
        let post = blog::parse_post_file(&std::fs::read_to_string(&path)?)?;
        if db.find::<blog::BlogPost>(|p| p.slug == post.slug)?.is_some() {
            continue;
        }
        tracing::debug!(path = %path.display(), "seeding blog post");
        blog::save_post(db, cache, post)?;
    }
    Ok(())
}

/// Seeds projects from `projects/*.yaml`. Projects whose slug already exists
/// are skipped.
pub fn projects(config: &Config, db: &Database, cache: &ListCache) -> Result<()> {
    for path in seed_files(config, "projects", &["yaml", "yml"])? {
        let project: Project = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;
        let slug = crate::slug::slugify(&project.title);
        if db.find_project_by_slug(&slug)?.is_some() {
            continue;
        }
        tracing::debug!(path = %path.display(), "seeding project");
        persist::save_project(db, cache, project, None)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitAdmin;
    use crate::Role;

    fn content_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("beacon-init-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("blog")).unwrap();
        std::fs::create_dir_all(dir.join("projects")).unwrap();
        std::fs::write(
            dir.join("blog/hello.md"),
            "---\ntitle: Hello\nexcerpt: First\ncategory: news\npublished: true\n---\n<p>Hi</p>\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("projects/wells.yaml"),
            r#"
title: Puits du Village
excerpt: Clean water
categories: [water]
status: In progress
content:
  - type: text
    content:
      heading: Why
      text: Water is life
  - id: "2"
    type: stats
    content:
      stats:
        - label: Wells
          value: "4"
"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn seeds_are_loaded_once() -> Result<()> {
        let dir = content_dir();
        let mut config = Config::default();
        config.init.content_dir = dir.to_string_lossy().to_string();
        config.admins = vec![InitAdmin {
            email: "root@example.org".into(),
            name: "Root".into(),
            password: "long enough".into(),
            role: Role::SuperAdmin,
        }];
        let db = Database::temporary()?;

        initialize(&config, &db)?;
        initialize(&config, &db)?;

        assert_eq!(admin::list(&db)?.len(), 1);
        assert_eq!(blog::list_all(&db)?.len(), 1);
        let project = db.find_project_by_slug("puits-du-village")?.unwrap();
        assert_eq!(project.content.len(), 2);
        assert_eq!(project.status, crate::ProjectStatus::InProgress);
        assert_eq!(db.list_projects()?.len(), 1);

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn missing_content_dir_is_fine() -> Result<()> {
        let mut config = Config::default();
        config.init.content_dir = "/nonexistent/beacon".into();
        initialize(&config, &Database::temporary()?)
    }
}
