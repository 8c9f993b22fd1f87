//! Projects presented on the public site.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::document::Document;
use crate::{slug, ErrorKind, Result};

pub type ProjectId = Uuid;

/// Lifecycle status of a project.
///
/// Operators may type anything here. The three well-known values are
/// recognized, other text is kept as is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    InProgress,
    Other(String),
}

impl From<String> for ProjectStatus {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "active" => ProjectStatus::Active,
            "completed" => ProjectStatus::Completed,
            "inprogress" => ProjectStatus::InProgress,
            _ => ProjectStatus::Other(s),
        }
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.to_string()
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Active => f.write_str("Active"),
            ProjectStatus::Completed => f.write_str("Completed"),
            ProjectStatus::InProgress => f.write_str("In progress"),
            ProjectStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: ProjectId,
    /// Derived from the title on every save.
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub hero_image: String,
    pub categories: BTreeSet<String>,
    pub start_date: String,
    pub location: String,
    pub people_helped: String,
    pub status: ProjectStatus,
    pub content: Document,
    pub goals: Vec<String>,
    pub gallery: Vec<String>,

    /// Unpublished projects are only visible in the back-office.
    pub published: bool,
    /// Incremented by every save.
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: String::new(),
            title: String::new(),
            excerpt: String::new(),
            hero_image: String::new(),
            categories: BTreeSet::new(),
            start_date: String::new(),
            location: String::new(),
            people_helped: String::new(),
            status: ProjectStatus::default(),
            content: Document::new(),
            goals: Vec::new(),
            gallery: Vec::new(),
            published: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Project {
    /// New project with an empty content document.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            slug: slug::slugify(&title),
            title,
            ..Default::default()
        }
    }

    /// Checks the fields required before the project can be saved.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.excerpt.trim().is_empty() {
            missing.push("excerpt");
        }
        if self.categories.iter().all(|c| c.trim().is_empty()) {
            missing.push("category");
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(ErrorKind::Validation(format!("Missing required fields: {}", missing.join(", "))).into())
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            hero_image: self.hero_image.clone(),
            categories: self.categories.clone(),
            status: self.status.clone(),
            published: self.published,
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry, without the content document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub hero_image: String,
    pub categories: BTreeSet<String>,
    pub status: ProjectStatus,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}
