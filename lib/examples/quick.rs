//! Shortest path to a running site: a custom home page next to the stock
//! routes, with sample content and a dev admin generated on startup.

use std::str::FromStr;

use axum::response::Html;
use axum::routing::get;
use axum::Extension;

use beacon::{config, persist, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config {
        address: std::net::SocketAddr::from_str("127.0.0.1:8001")?,
        db: config::Db {
            temporary: true,
            ..Default::default()
        },
        dev: config::DevMode {
            enabled: true,
            mock: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let router = beacon::axum::Router::new().route("/", get(home));

    println!(
        "log in at /admin/login with {} / {}",
        beacon::mock::MOCK_ADMIN_EMAIL,
        beacon::mock::MOCK_ADMIN_PASSWORD
    );
    beacon::axum::start(router, config).await?;

    Ok(())
}

async fn home(
    Extension(db): beacon::axum::DbExt,
    Extension(cache): beacon::axum::CacheExt,
) -> beacon::Result<Html<String>> {
    let mut html = String::from("<h1>Projects</h1><ul>");
    for project in persist::list_published(&*db, &cache)? {
        // Slugs are plain ascii, no escaping needed.
        html.push_str(&format!(
            "<li><a href=\"/projects/{0}\">{0}</a></li>",
            project.slug
        ));
    }
    html.push_str("</ul>");
    Ok(Html(html))
}
