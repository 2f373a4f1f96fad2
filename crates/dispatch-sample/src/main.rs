//! # Blog Sample
//!
//! Walks through every action against the in-memory blog:
//! 1. Create an author and two posts.
//! 2. List posts filtered by tag, sorted and paginated.
//! 3. Try to delete a post as someone else, then as its author.
//! 4. Try to delete an author who still has posts.
//!
//! Run with `RUST_LOG=info` (or `debug` to see every step).

use dispatch_sample::error::BlogError;
use dispatch_sample::lifecycle::BlogSystem;
use dispatch_sample::router::Request;
use dispatch_sample::settings::BlogSettings;
use resource_dispatch::tracing::setup_tracing;
use resource_dispatch::Response;
use serde_json::json;
use tracing::{info, info_span, Instrument};

fn log(step: &str, response: &Response) {
    let body = response
        .json()
        .map(|body| body.to_string())
        .unwrap_or_default();
    info!(step, status = %response.status, %body, "Response");
}

#[tokio::main]
async fn main() -> Result<(), BlogError> {
    setup_tracing();

    let settings = BlogSettings::load()?;
    info!(?settings, "Starting blog");
    let blog = BlogSystem::start(&settings);

    async {
        let author = json!({
            "data": { "type": "authors", "attributes": { "name": "Ada", "email": "ada@example.com" } }
        });
        log("create author", &blog.handle(Request::post("/authors", author)).await);

        for (title, tags) in [("Actors in Rust", ["rust", "async"]), ("Gardening", ["outdoors", "spring"])] {
            let post = json!({
                "data": { "type": "posts", "attributes": { "title": title, "tags": tags } }
            });
            log("create post", &blog.handle(Request::post("/posts", post).as_caller("1")).await);
        }
    }
    .instrument(info_span!("seeding"))
    .await;

    async {
        let listed = blog
            .handle(Request::get("/posts?filter[tag]=rust&sort=-title&page[number]=1&page[size]=10"))
            .await;
        log("list rust posts", &listed);
    }
    .instrument(info_span!("browsing"))
    .await;

    async {
        log("delete as stranger", &blog.handle(Request::delete("/posts/1").as_caller("99")).await);
        log("delete as author", &blog.handle(Request::delete("/posts/1").as_caller("1")).await);
        log("show archived", &blog.handle(Request::get("/posts/1")).await);
        log("delete busy author", &blog.handle(Request::delete("/authors/1")).await);
    }
    .instrument(info_span!("cleanup"))
    .await;

    blog.shutdown().await?;
    info!("Done");
    Ok(())
}
