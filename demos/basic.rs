//! Minimal trellis example: handlers, a mounted resource, a filter, static files.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/hello/Dave
//!   curl http://localhost:3000/add/22/20
//!   curl 'http://localhost:3000/search?q=rust'
//!   curl -X POST http://localhost:3000/users -d 'firstName=John&lastName=Doe'
//!   curl -X POST http://localhost:3000/hello/Dave      → 405
//!   curl http://localhost:3000/admin                   → 403 from the filter

use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use trellis::{Dispatcher, Form, Json, Payload, Request, Resource, Router, Server};
use tracing_subscriber::EnvFilter;

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NewUser {
    first_name: String,
    last_name: String,
}

#[derive(Serialize)]
struct User {
    id: u32,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let users = Resource::new()
        .get("/:id", get_user)
        .post("", create_user);

    let router = Router::new()
        .get("/hello/:name", |name: String| async move { format!("Hello {name}") })?
        .get("/add/:left/:right", |left: i64, right: i64| async move { left + right })?
        .get("/search?q=:q", |q: String| async move { format!("searching for {q}") })?
        .mount("/users", users)?
        .filter(|req: &Request| {
            req.path().starts_with("/admin").then(|| Payload::status(StatusCode::FORBIDDEN))
        })
        .static_dir("public");

    let dispatcher = Arc::new(Dispatcher::new(router));
    Server::bind("0.0.0.0:3000").serve(dispatcher).await?;
    Ok(())
}

// GET /users/:id
async fn get_user(id: u32) -> Json<User> {
    Json(User { id, name: "alice".into() })
}

// POST /users
async fn create_user(Form(user): Form<NewUser>) -> Result<Payload, std::io::Error> {
    let body = format!("CREATED {} {}", user.first_name, user.last_name);
    Ok(Payload::html(body).with_status(StatusCode::CREATED))
}
