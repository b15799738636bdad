//! Bootstrap data for an empty store.
//!
//! Three demonstration agents and one bootstrap log line. Seeding never
//! touches a store that already holds agents.

use orchestra_core::{AgentColor, AgentStatus, CreateAgentInput, CreateLogInput, LogLevel};
use orchestra_storage::{StorageResult, Store};

const AVATAR_BASE: &str = "https://api.dicebear.com/9.x/bottts-neutral/svg?seed=";

/// What [`seed_store`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store was empty and now holds the bootstrap data
    Seeded { agents: usize },
    /// The store already had this many agents; nothing was written
    Skipped { existing: u64 },
}

fn bootstrap_agent(
    name: &str,
    role: &str,
    status: AgentStatus,
    version: &str,
    message: &str,
    avatar_seed: &str,
    color: AgentColor,
) -> CreateAgentInput {
    CreateAgentInput {
        role: Some(role.to_string()),
        status,
        version: Some(version.to_string()),
        message: Some(message.to_string()),
        image_url: Some(format!("{}{}", AVATAR_BASE, avatar_seed)),
        color: Some(color),
        ..CreateAgentInput::named(name)
    }
}

/// The demonstration agents, in insertion order.
pub fn bootstrap_agents() -> Vec<CreateAgentInput> {
    vec![
        bootstrap_agent(
            "OMEGA-7",
            "SYSTEM_ARCHITECT",
            AgentStatus::Running,
            "4.2.1",
            "Optimizing Neural Pathways",
            "omega",
            AgentColor::Blue,
        ),
        bootstrap_agent(
            "ZETA-9",
            "SECURITY_PROTOCOL",
            AgentStatus::Idle,
            "2.0.5",
            "Firewall Active. Scanning ports...",
            "zeta",
            AgentColor::Red,
        ),
        bootstrap_agent(
            "ALPHA-CORE",
            "DATA_PROCESSOR",
            AgentStatus::Running,
            "1.2.0",
            "Ingesting dataset: batch_992",
            "alpha",
            AgentColor::Yellow,
        ),
    ]
}

fn bootstrap_log() -> CreateLogInput {
    CreateLogInput {
        level: LogLevel::Sys,
        source: "BOOTSTRAP".to_string(),
        message: "System Initialization Complete. DB Seeded.".to_string(),
    }
}

/// Seed `store` if it has no agents.
pub async fn seed_store(store: &dyn Store) -> StorageResult<SeedOutcome> {
    let existing = store.agent_count().await?;
    if existing > 0 {
        tracing::info!(existing, "Store already has agents, skipping seed");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let agents = bootstrap_agents();
    for input in &agents {
        let agent = store.agent_insert(input).await?;
        tracing::info!(agent_id = %agent.id, name = %agent.name, "Created agent");
    }
    store.log_insert(&bootstrap_log()).await?;

    tracing::info!(agents = agents.len(), "Seeding finished");
    Ok(SeedOutcome::Seeded {
        agents: agents.len(),
    })
}
