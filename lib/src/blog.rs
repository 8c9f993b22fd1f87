//! Blog posts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::ListCache;
use crate::db::{Collectable, Identifiable};
use crate::{slug, Database, ErrorKind, Result};

pub type PostId = Uuid;

/// Cache key of the public blog listing.
pub const BLOG_LIST_KEY: &str = "blog";

/// Tree holding the view counter of every post, keyed by post id.
const VIEWS_TREE: &str = "post_views";

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    /// Rich text body, stored as html and displayed as is.
    pub content: String,
    pub cover_image: String,
    pub category: String,
    /// Comma-separated.
    pub tags: String,
    pub status: PostStatus,
    /// Set on the first transition to published, cleared on reversion to
    /// draft.
    pub published_at: Option<DateTime<Utc>>,
    /// Filled from the view counter when the post is read. The value stored
    /// with the post itself is never used.
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for BlogPost {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: String::new(),
            title: String::new(),
            excerpt: String::new(),
            content: String::new(),
            cover_image: String::new(),
            category: String::new(),
            tags: String::new(),
            status: PostStatus::Draft,
            published_at: None,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Collectable for BlogPost {
    fn get_collection_name() -> &'static str {
        "post"
    }
}

impl Identifiable for BlogPost {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl BlogPost {
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.excerpt.trim().is_empty() {
            missing.push("excerpt");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(ErrorKind::Validation(format!("Missing required fields: {}", missing.join(", "))).into())
    }

    /// Tags split out of the comma-separated field.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Moves the post to `status`, keeping `published_at` consistent with it.
    pub fn set_status(&mut self, status: PostStatus, now: DateTime<Utc>) {
        match status {
            PostStatus::Published => {
                if self.published_at.is_none() {
                    self.published_at = Some(now);
                }
            }
            PostStatus::Draft => self.published_at = None,
        }
        self.status = status;
    }
}

/// Post file front matter, the YAML header between `---` lines.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: String,
    pub published: bool,
    pub date: Option<DateTime<Utc>>,
}

/// Builds a post out of a file with YAML front matter followed by the body.
pub fn parse_post_file(text: &str) -> Result<BlogPost> {
    let text = text.trim_start_matches('\u{feff}');
    let rest = text
        .strip_prefix("---")
        .ok_or_else(|| ErrorKind::ParsingError("post file must start with front matter".into()))?;
    let (header, body) = rest
        .split_once("\n---")
        .ok_or_else(|| ErrorKind::ParsingError("unterminated front matter".into()))?;
    let front: FrontMatter = serde_yaml::from_str(header)?;

    let mut post = BlogPost {
        slug: slug::slugify(&front.title),
        title: front.title,
        excerpt: front.excerpt,
        content: body.trim_start_matches(['\r', '\n']).trim_end().to_string(),
        cover_image: front.cover_image,
        category: front.category,
        tags: front.tags.join(", "),
        ..Default::default()
    };
    if let Some(date) = front.date {
        post.created_at = date;
        post.updated_at = date;
    }
    if front.published {
        post.set_status(PostStatus::Published, front.date.unwrap_or_else(Utc::now));
    }
    Ok(post)
}

/// Validates and stores the post. The slug is recomputed from the title and
/// must not be taken by another post.
pub fn save_post(db: &Database, cache: &ListCache, post: BlogPost) -> Result<BlogPost> {
    post.validate()?;
    let slug = slug::slugify(&post.title);
    if slug.is_empty() {
        return Err(
            ErrorKind::Validation("Title must contain at least one letter or digit".into()).into(),
        );
    }

    let post = db.write_locked(|| {
        let mut post = post;
        if let Some(other) = db.find::<BlogPost>(|p| p.slug == slug)? {
            if other.id != post.id {
                return Err(ErrorKind::SlugConflict(slug).into());
            }
        }

        let now = Utc::now();
        match db.get::<BlogPost>(post.id) {
            Ok(existing) => {
                post.created_at = existing.created_at;
                if post.published_at.is_none() {
                    post.published_at = existing.published_at;
                }
                if existing.slug != slug {
                    tracing::warn!(post = %post.id, old = %existing.slug, new = %slug,
                        "title change moved the public address of the post");
                }
            }
            Err(e) if matches!(e.kind, ErrorKind::NotFound(_)) => post.created_at = now,
            Err(e) => return Err(e),
        }

        // Keep the timestamp consistent with whatever status the editor sent.
        let status = post.status;
        post.set_status(status, now);
        post.slug = slug;
        post.updated_at = now;

        db.set(&post)?;
        Ok(post)
    })?;
    cache.clear();
    tracing::info!(post = %post.id, slug = %post.slug, status = %post.status, "post saved");
    with_views(db, post)
}

pub fn delete_post(db: &Database, cache: &ListCache, id: PostId) -> Result<()> {
    if !db.remove_by_id::<BlogPost>(id)? {
        return Err(ErrorKind::NotFound(format!("post {id}")).into());
    }
    db.remove_at(VIEWS_TREE, id)?;
    cache.clear();
    Ok(())
}

fn with_views(db: &Database, mut post: BlogPost) -> Result<BlogPost> {
    post.views = db.counter_at(VIEWS_TREE, post.id)?;
    Ok(post)
}

/// Resolves a published post by slug.
pub fn find_published(db: &Database, slug: &str) -> Result<BlogPost> {
    match db.find::<BlogPost>(|p| p.slug == slug)? {
        Some(post) if post.is_published() => with_views(db, post),
        _ => Err(ErrorKind::NotFound(format!("post {slug}")).into()),
    }
}

/// Bumps the view counter of the post and returns the new count.
///
/// Only the counter is written, the post itself is left alone. Failures are
/// logged and reported as `None`.
pub fn record_view(db: &Database, id: PostId) -> Option<u64> {
    match db.increment_at(VIEWS_TREE, id) {
        Ok(views) => Some(views),
        Err(e) => {
            tracing::debug!(post = %id, "failed recording view: {e}");
            None
        }
    }
}

/// Published posts, most recent first.
pub fn list_published(db: &Database, cache: &ListCache) -> Result<Vec<BlogPost>> {
    cache.get_or_try_insert(BLOG_LIST_KEY, || {
        let mut posts = db
            .get_collection::<BlogPost>()?
            .into_iter()
            .filter(BlogPost::is_published)
            .map(|p| with_views(db, p))
            .collect::<Result<Vec<_>>>()?;
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    })
}

/// Every post including drafts, most recently updated first.
pub fn list_all(db: &Database) -> Result<Vec<BlogPost>> {
    let mut posts = db
        .get_collection::<BlogPost>()?
        .into_iter()
        .map(|p| with_views(db, p))
        .collect::<Result<Vec<_>>>()?;
    posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(posts)
}
