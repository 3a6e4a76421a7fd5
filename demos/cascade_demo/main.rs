//! Cascade walkthrough over the in-memory store
//!
//! This example demonstrates:
//! - Seeding a small course catalog
//! - Dry-run counts (what `isWarning` returns to clients)
//! - Soft-deleting a user and everything they created
//! - Hard-deleting an instructor and their courses
//!
//! Run with `RUST_LOG=coursehub=debug cargo run --example cascade_demo` to see
//! each cascade step.

use coursehub::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ADA: &str = "650000000000000000000001";
const LINUS: &str = "650000000000000000000002";
const SYSTEMS: &str = "650000000000000000000010";
const FERRIS: &str = "650000000000000000000020";
const GOPHER: &str = "650000000000000000000021";
const ADMIN: &str = "650000000000000000000030";

fn seed(store: &InMemoryDocumentStore) -> Result<()> {
    store.insert_many(
        EntityType::User,
        vec![
            json!({"_id": ADA, "username": "ada"}),
            json!({"_id": LINUS, "username": "linus", "addedBy": ADA}),
        ],
    )?;
    store.insert(
        EntityType::Category,
        json!({"_id": SYSTEMS, "name": "Systems", "addedBy": ADA}),
    )?;
    store.insert_many(
        EntityType::Instructor,
        vec![
            json!({"_id": FERRIS, "name": "Ferris", "addedBy": ADA}),
            json!({"_id": GOPHER, "name": "Gopher", "addedBy": LINUS}),
        ],
    )?;
    store.insert_many(
        EntityType::Course,
        vec![
            json!({"_id": "650000000000000000000040", "title": "Rust", "Live": SYSTEMS, "instructorName": FERRIS, "addedBy": ADA}),
            json!({"_id": "650000000000000000000041", "title": "Go", "Recorded": SYSTEMS, "instructorName": GOPHER, "addedBy": LINUS}),
        ],
    )?;
    store.insert(
        EntityType::Role,
        json!({"_id": ADMIN, "name": "admin", "addedBy": ADA}),
    )?;
    store.insert_many(
        EntityType::UserRole,
        vec![
            json!({"_id": "650000000000000000000050", "userId": ADA, "roleId": ADMIN}),
            json!({"_id": "650000000000000000000051", "userId": LINUS, "roleId": ADMIN}),
        ],
    )?;
    store.insert(
        EntityType::UserTokens,
        json!({"_id": "650000000000000000000060", "userId": LINUS, "token": "secret"}),
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coursehub=info")),
        )
        .init();

    let store = Arc::new(InMemoryDocumentStore::new());
    seed(&store)?;

    let config = CascadeConfig::default_config();
    let resolver = DependencyGraphResolver::new(store.clone(), config.dependency_table()?)
        .with_options(config.resolver_options());

    println!("\n🔍 Dry run: what would deleting the Systems category remove?");
    let warning = resolver
        .count(EntityType::Category, &Filter::eq("_id", SYSTEMS))
        .await?;
    println!("   {}", warning);

    println!("\n🗑️  Soft-deleting linus");
    let payload = UpdatePayload::soft_delete(ADA);
    let soft = resolver
        .soft_delete(EntityType::User, &Filter::eq("_id", LINUS), &payload)
        .await?;
    println!("   {}", serde_json::to_string(&ApiResponse::success(soft))?);

    println!("\n💥 Deleting instructor Ferris");
    let deleted = resolver
        .delete(EntityType::Instructor, &Filter::eq("_id", FERRIS))
        .await?;
    println!("   {}", deleted);

    println!("\n📦 Remaining courses:");
    for course in store.all(EntityType::Course)? {
        println!(
            "   - {} (deleted: {})",
            course["title"],
            course.get("isDeleted").cloned().unwrap_or(json!(false))
        );
    }

    Ok(())
}
