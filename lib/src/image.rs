//! Images uploaded through the back-office and served from the database, as
//! opposed to static image assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Collectable, Identifiable};

pub type ImageId = uuid::Uuid;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Image {
    pub id: ImageId,
    /// Mime type sent back when serving the image.
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

impl Image {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: ImageId::new_v4(),
            content_type: content_type.into(),
            bytes,
            uploaded_at: Utc::now(),
        }
    }
}

impl Collectable for Image {
    fn get_collection_name() -> &'static str {
        "images"
    }
}

impl Identifiable for Image {
    fn get_id(&self) -> uuid::Uuid {
        self.id
    }
}
