//! Persistence of projects.
//!
//! Projects are stored as [`ProjectRecord`]s, with the content document kept
//! as a json text column holding the `[{ id, type, content }]` array. Saving
//! goes through [`save_project`], which owns validation, slug derivation,
//! conflict detection and cache invalidation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::ListCache;
use crate::db::{Collectable, Identifiable};
use crate::document::Document;
use crate::project::{Project, ProjectId, ProjectSummary};
use crate::{slug, Database, ErrorKind, Result};

/// Cache key of the public project listing.
pub const PROJECT_LIST_KEY: &str = "projects";

/// Stored form of a [`Project`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub hero_image: String,
    pub categories: Vec<String>,
    pub start_date: String,
    pub location: String,
    pub people_helped: String,
    pub status: String,
    pub content_json: String,
    pub goals: Vec<String>,
    pub gallery: Vec<String>,
    pub published: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn from_project(project: &Project) -> Result<Self> {
        Ok(Self {
            id: project.id,
            slug: project.slug.clone(),
            title: project.title.clone(),
            excerpt: project.excerpt.clone(),
            hero_image: project.hero_image.clone(),
            categories: project.categories.iter().cloned().collect(),
            start_date: project.start_date.clone(),
            location: project.location.clone(),
            people_helped: project.people_helped.clone(),
            status: project.status.to_string(),
            content_json: project.content.to_json()?,
            goals: project.goals.clone(),
            gallery: project.gallery.clone(),
            published: project.published,
            version: project.version,
            created_at: project.created_at,
            updated_at: project.updated_at,
        })
    }

    pub fn into_project(self) -> Result<Project> {
        let content = if self.content_json.trim().is_empty() {
            Document::new()
        } else {
            Document::from_json(&self.content_json)?
        };
        Ok(Project {
            id: self.id,
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            hero_image: self.hero_image,
            categories: self.categories.into_iter().collect(),
            start_date: self.start_date,
            location: self.location,
            people_helped: self.people_helped,
            status: self.status.into(),
            content,
            goals: self.goals,
            gallery: self.gallery,
            published: self.published,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Collectable for ProjectRecord {
    fn get_collection_name() -> &'static str {
        "project"
    }
}

impl Identifiable for ProjectRecord {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// Storage backend for projects.
pub trait ProjectStore {
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>>;
    fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>>;
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn put_project(&self, project: &Project) -> Result<()>;
    /// Returns whether anything was removed.
    fn delete_project(&self, id: ProjectId) -> Result<bool>;

    /// Runs `f` with no other exclusive section of the store in progress.
    fn exclusive<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        f()
    }
}

impl ProjectStore for Database {
    fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
        match self.get::<ProjectRecord>(id) {
            Ok(record) => Ok(Some(record.into_project()?)),
            Err(e) if matches!(e.kind, ErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        self.find::<ProjectRecord>(|r| r.slug == slug)?
            .map(ProjectRecord::into_project)
            .transpose()
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_collection::<ProjectRecord>()?
            .into_iter()
            .map(ProjectRecord::into_project)
            .collect()
    }

    fn put_project(&self, project: &Project) -> Result<()> {
        self.set(&ProjectRecord::from_project(project)?)
    }

    fn delete_project(&self, id: ProjectId) -> Result<bool> {
        self.remove_by_id::<ProjectRecord>(id)
    }

    fn exclusive<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.write_locked(f)
    }
}

/// Validates and stores the project, returning the stored version.
///
/// The slug is recomputed from the title. When `expected_version` is given
/// it must match the stored version, otherwise the save is rejected so that
/// concurrent edits don't silently overwrite each other.
pub fn save_project(
    store: &impl ProjectStore,
    cache: &ListCache,
    project: Project,
    expected_version: Option<u64>,
) -> Result<Project> {
    project.validate()?;

    let slug = slug::slugify(&project.title);
    if slug.is_empty() {
        return Err(
            ErrorKind::Validation("Title must contain at least one letter or digit".into()).into(),
        );
    }

    let project = store.exclusive(|| {
        let mut project = project;
        let now = Utc::now();
        match store.get_project(project.id)? {
            Some(existing) => {
                if let Some(expected) = expected_version {
                    if expected != existing.version {
                        return Err(ErrorKind::VersionConflict {
                            expected,
                            found: existing.version,
                        }
                        .into());
                    }
                }
                if existing.slug != slug {
                    tracing::warn!(
                        project = %project.id,
                        old = %existing.slug,
                        new = %slug,
                        "title change moved the public address of the project"
                    );
                }
                project.created_at = existing.created_at;
                project.version = existing.version + 1;
            }
            None => {
                if expected_version.is_some() {
                    return Err(ErrorKind::NotFound(format!("project {}", project.id)).into());
                }
                project.created_at = now;
                project.version = 1;
            }
        }

        if let Some(other) = store.find_project_by_slug(&slug)? {
            if other.id != project.id {
                return Err(ErrorKind::SlugConflict(slug).into());
            }
        }

        project.slug = slug;
        project.updated_at = now;
        project.content.dedup_ids();

        store.put_project(&project)?;
        Ok(project)
    })?;
    cache.clear();
    tracing::info!(project = %project.id, slug = %project.slug, version = project.version, "project saved");

    Ok(project)
}

/// Hard-deletes the project.
pub fn delete_project(store: &impl ProjectStore, cache: &ListCache, id: ProjectId) -> Result<()> {
    if !store.delete_project(id)? {
        return Err(ErrorKind::NotFound(format!("project {id}")).into());
    }
    cache.clear();
    tracing::info!(project = %id, "project deleted");
    Ok(())
}

/// Resolves a project for the public page. Unpublished projects are reported
/// as not found.
pub fn load_project(store: &impl ProjectStore, slug: &str) -> Result<Project> {
    match store.find_project_by_slug(slug)? {
        Some(project) if project.published => Ok(project),
        _ => Err(ErrorKind::NotFound(format!("project {slug}")).into()),
    }
}

/// Published projects, most recently created first.
pub fn list_published(store: &impl ProjectStore, cache: &ListCache) -> Result<Vec<ProjectSummary>> {
    cache.get_or_try_insert(PROJECT_LIST_KEY, || {
        let mut projects: Vec<Project> = store
            .list_projects()?
            .into_iter()
            .filter(|p| p.published)
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects.iter().map(Project::summary).collect())
    })
}

/// Every project, including unpublished ones, for the back-office.
pub fn list_all(store: &impl ProjectStore) -> Result<Vec<ProjectSummary>> {
    let mut projects = store.list_projects()?;
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(projects.iter().map(Project::summary).collect())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use super::*;
    use crate::block::BlockKind;

    /// In-memory store counting every call made to it.
    #[derive(Default)]
    struct MemoryStore {
        projects: RefCell<Vec<Project>>,
        calls: Cell<usize>,
    }

    impl MemoryStore {
        fn touch(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    impl ProjectStore for MemoryStore {
        fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
            self.touch();
            Ok(self.projects.borrow().iter().find(|p| p.id == id).cloned())
        }

        fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
            self.touch();
            Ok(self.projects.borrow().iter().find(|p| p.slug == slug).cloned())
        }

        fn list_projects(&self) -> Result<Vec<Project>> {
            self.touch();
            Ok(self.projects.borrow().clone())
        }

        fn put_project(&self, project: &Project) -> Result<()> {
            self.touch();
            let mut projects = self.projects.borrow_mut();
            projects.retain(|p| p.id != project.id);
            projects.push(project.clone());
            Ok(())
        }

        fn delete_project(&self, id: ProjectId) -> Result<bool> {
            self.touch();
            let mut projects = self.projects.borrow_mut();
            let len = projects.len();
            projects.retain(|p| p.id != id);
            Ok(projects.len() != len)
        }
    }

    fn cache() -> ListCache {
        ListCache::new(Duration::from_secs(60))
    }

    fn valid(title: &str) -> Project {
        let mut project = Project::new(title);
        project.excerpt = "Short summary".into();
        project.categories.insert("education".into());
        project
    }

    #[test]
    fn empty_title_is_rejected_without_store_call() {
        let store = MemoryStore::default();
        let mut project = valid("");
        project.title = "   ".into();
        let err = save_project(&store, &cache(), project, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));
        assert!(err.public_message().contains("title"));
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn punctuation_only_title_is_rejected() {
        let store = MemoryStore::default();
        let err = save_project(&store, &cache(), valid("!!!"), None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn save_derives_slug_and_versions() {
        let store = MemoryStore::default();
        let cache = cache();
        let mut project = valid("Aide Aux Écoles");
        project.slug = "whatever".into();

        let saved = save_project(&store, &cache, project, None).unwrap();
        assert_eq!(saved.slug, "aide-aux-ecoles");
        assert_eq!(saved.version, 1);

        let again = save_project(&store, &cache, saved.clone(), Some(1)).unwrap();
        assert_eq!(again.version, 2);
        assert_eq!(again.created_at, saved.created_at);
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = MemoryStore::default();
        let cache = cache();
        let saved = save_project(&store, &cache, valid("Puits"), None).unwrap();
        save_project(&store, &cache, saved.clone(), Some(1)).unwrap();

        let err = save_project(&store, &cache, saved, Some(1)).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::VersionConflict {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn save_without_version_is_last_write_wins() {
        let store = MemoryStore::default();
        let cache = cache();
        let saved = save_project(&store, &cache, valid("Puits"), None).unwrap();
        save_project(&store, &cache, saved.clone(), None).unwrap();
        let last = save_project(&store, &cache, saved, None).unwrap();
        assert_eq!(last.version, 3);
    }

    #[test]
    fn slug_collision_is_rejected() {
        let store = MemoryStore::default();
        let cache = cache();
        save_project(&store, &cache, valid("Café d'Espoir"), None).unwrap();
        let err = save_project(&store, &cache, valid("CAFE D'ESPOIR!"), None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SlugConflict(ref s) if s == "cafe-despoir"));
        assert_eq!(store.projects.borrow().len(), 1);
    }

    #[test]
    fn update_of_missing_project_with_version_is_not_found() {
        let store = MemoryStore::default();
        let err = save_project(&store, &cache(), valid("Puits"), Some(3)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
        assert!(store.projects.borrow().is_empty());
    }

    #[test]
    fn writes_clear_listing_cache() {
        let store = MemoryStore::default();
        let cache = cache();
        let saved = save_project(&store, &cache, valid("Puits"), None).unwrap();
        assert_eq!(list_published(&store, &cache).unwrap().len(), 1);
        assert!(!cache.is_empty());

        save_project(&store, &cache, valid("Cantine"), None).unwrap();
        assert!(cache.is_empty());
        assert_eq!(list_published(&store, &cache).unwrap().len(), 2);

        delete_project(&store, &cache, saved.id).unwrap();
        assert!(cache.is_empty());
        assert_eq!(list_published(&store, &cache).unwrap().len(), 1);
    }

    #[test]
    fn unpublished_projects_are_not_found_publicly() {
        let store = MemoryStore::default();
        let cache = cache();
        let mut project = valid("Brouillon");
        project.published = false;
        save_project(&store, &cache, project, None).unwrap();

        let err = load_project(&store, "brouillon").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
        assert!(list_published(&store, &cache).unwrap().is_empty());
        assert_eq!(list_all(&store).unwrap().len(), 1);
    }

    #[test]
    fn deleting_missing_project_is_not_found() {
        let store = MemoryStore::default();
        let err = delete_project(&store, &cache(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    }

    #[test]
    fn record_round_trip_keeps_document() {
        let mut project = valid("Puits");
        project.content.insert_block(BlockKind::Faq);
        project.content.insert_block(BlockKind::Video);
        project.status = "Paused".to_string().into();

        let record = ProjectRecord::from_project(&project).unwrap();
        assert!(record.content_json.starts_with('['));
        assert_eq!(record.into_project().unwrap(), project);
    }
}
