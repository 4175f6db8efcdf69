pub mod ask;
pub mod core;
pub mod profiles;

use serde::Serialize;

use knowledge_vault::config::Config;
use knowledge_vault::error::Result;
use knowledge_vault::store::{KnowledgeStore, Profile};

/// Everything a command needs: resolved config, the active profile and the
/// store it operates on.
pub struct Context {
    pub config: Config,
    pub profile: Profile,
    pub store: KnowledgeStore,
    pub json: bool,
    pub verbose: bool,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Single-line excerpt of at most `max_len` characters
pub fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.replace('\n', " ").trim().to_string();
    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let head: String = cleaned.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
