//! Database Seeding Binary
//!
//! Inserts the bootstrap agents into an empty PostgreSQL store, then prints
//! the agents it finds.
//!
//! Usage:
//!   cargo run -p orchestra-api --bin orchestra-seed            # seed if empty
//!   cargo run -p orchestra-api --bin orchestra-seed -- --check # list only

use orchestra_api::telemetry::init_tracing;
use orchestra_api::{seed_store, ApiResult, DbConfig, LogFormat, PgStore, SeedOutcome};
use orchestra_storage::Store;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(LogFormat::from_env())?;

    let check_only = std::env::args().skip(1).any(|arg| arg == "--check");

    let store = PgStore::from_config(&DbConfig::from_env())?;
    store.migrate().await?;

    if !check_only {
        match seed_store(&store).await? {
            SeedOutcome::Seeded { agents } => println!("Seeded {} agents.", agents),
            SeedOutcome::Skipped { existing } => {
                println!("Store already has {} agents; nothing seeded.", existing)
            }
        }
    }

    let agents = store.agent_list().await?;
    println!("Agents ({}):", agents.len());
    for agent in &agents {
        println!(
            "  {:<12} {:<8} {:<20} {} memories",
            agent.name,
            agent.status.as_str(),
            agent.role.as_deref().unwrap_or("-"),
            agent.memories.len()
        );
    }

    Ok(())
}
