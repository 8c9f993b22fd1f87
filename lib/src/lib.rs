//! Content site for non-profit organisations.
//!
//! Public pages expose projects, blog posts and contact/donation forms. The
//! admin back-office manages all of the above plus admin accounts and the
//! inbound messages.
//!
//! The most involved part is the project page builder: a project carries a
//! [`Document`] made of typed [`Block`]s which is edited block-by-block,
//! persisted as a JSON array and rendered back into markup by the
//! [`render`] module.

#![allow(clippy::new_without_default)]

#[macro_use]
extern crate serde_derive;

pub mod action;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod block;
pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod document;
pub mod editor;
pub mod email;
pub mod error;
pub mod image;
pub mod init;
pub mod message;
pub mod mock;
pub mod persist;
pub mod project;
pub mod render;
pub mod routes;
pub mod slug;
pub mod tracing;
pub mod upload;
pub mod util;

#[cfg(feature = "axum")]
pub mod axum;

pub use action::ActionResult;
pub use admin::{Admin, AdminId, Role};
pub use block::{Block, BlockId, BlockKind, Payload};
pub use blog::{BlogPost, PostStatus};
pub use cache::ListCache;
pub use config::Config;
pub use db::Database;
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use image::{Image, ImageId};
pub use message::{Message, MessageKind};
pub use project::{Project, ProjectId, ProjectStatus};
