use std::io::IsTerminal;
use std::path::PathBuf;

use colored::Colorize;

use knowledge_vault::error::{Result, VaultError};
use knowledge_vault::retrieval::RetrievalFacade;

use super::{print_json, truncate_text, Context};

// ── Add ─────────────────────────────────────────────────────────────────

pub fn cmd_add(
    ctx: &mut Context,
    topic: &str,
    content: Option<String>,
    file: Option<PathBuf>,
    source: &str,
) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(VaultError::Config("Topic must not be empty".into()));
    }

    let content = match (content, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (None, None) => std::io::read_to_string(std::io::stdin())?,
    };

    if content.trim().is_empty() {
        return Err(VaultError::Config(
            "No content given (use --content, --file or pipe text on stdin)".into(),
        ));
    }

    let id = ctx.store.add(topic, &content, source, &ctx.profile)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "id": id,
            "topic": topic,
            "profile": ctx.profile,
        }));
    }

    println!(
        "{} '{}' stored as #{} in profile '{}'",
        "Added".green().bold(),
        topic,
        id,
        ctx.profile
    );
    Ok(())
}

// ── Search ──────────────────────────────────────────────────────────────

pub fn cmd_search(ctx: &mut Context, query: &str, top_k: Option<usize>, exact: bool) -> Result<()> {
    if exact {
        return cmd_show(ctx, query);
    }

    let top_k = top_k.unwrap_or(ctx.config.default_top_k);
    let results = ctx.store.search(query, top_k, &ctx.profile)?;

    if ctx.json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!(
            "{} Nothing stored in profile '{}' yet.",
            "Not found:".yellow(),
            ctx.profile
        );
        return Ok(());
    }

    println!("{} Results for '{}':\n", "Search".green().bold(), query);
    for hit in &results {
        println!(
            "  {} #{} [{}] ({:.1}%)",
            ">".green(),
            hit.record.id,
            hit.record.topic.cyan(),
            hit.score * 100.0
        );
        println!(
            "    {} {}",
            hit.record.source.dimmed(),
            hit.record.date_string().dimmed()
        );
        println!("    {}\n", truncate_text(&hit.record.content, 150));
    }
    Ok(())
}

// ── Show ────────────────────────────────────────────────────────────────

pub fn cmd_show(ctx: &mut Context, topic: &str) -> Result<()> {
    let records = ctx.store.search_exact(topic, &ctx.profile)?;

    if ctx.json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("{} No records for topic '{}'.", "Not found:".yellow(), topic);
        let suggestions =
            RetrievalFacade::new(&mut ctx.store).suggest_topics(topic, 5, &ctx.profile)?;
        if !suggestions.is_empty() {
            println!("  Did you mean:");
            for s in suggestions {
                println!("    {}", s.cyan());
            }
        }
        return Ok(());
    }

    println!("{} {}\n", "Topic".green().bold(), topic.bold());
    for record in &records {
        println!(
            "  {} #{} {} {}",
            ">".green(),
            record.id,
            record.source.dimmed(),
            record.date_string().dimmed()
        );
        for line in record.content.lines() {
            println!("    {}", line);
        }
        println!();
    }
    Ok(())
}

// ── Topics ──────────────────────────────────────────────────────────────

pub fn cmd_topics(ctx: &mut Context, counts: bool, groups: bool) -> Result<()> {
    let mut facade = RetrievalFacade::new(&mut ctx.store);

    if groups {
        let groups = facade.topic_groups(&ctx.profile)?;
        if ctx.json {
            return print_json(&groups);
        }
        for (group, topics) in &groups {
            println!("{} ({})", group.bold(), topics.len());
            for topic in topics {
                println!("  {}", topic.cyan());
            }
        }
        return Ok(());
    }

    if counts {
        let counts = facade.topic_counts(&ctx.profile)?;
        if ctx.json {
            return print_json(&counts);
        }
        for (topic, n) in &counts {
            println!("  {} {}", topic.cyan(), format!("({})", n).dimmed());
        }
        return Ok(());
    }

    let topics = facade.topics(&ctx.profile)?;
    if ctx.json {
        return print_json(&topics);
    }
    if topics.is_empty() {
        println!(
            "{} Profile '{}' has no topics.",
            "Not found:".yellow(),
            ctx.profile
        );
        return Ok(());
    }
    for topic in &topics {
        println!("  {}", topic.cyan());
    }
    Ok(())
}

// ── Delete ──────────────────────────────────────────────────────────────

pub fn cmd_delete(ctx: &mut Context, topic: &str, yes: bool) -> Result<()> {
    let matching = ctx.store.search_exact(topic, &ctx.profile)?.len();

    if matching > 0 && !yes {
        if !std::io::stdin().is_terminal() {
            return Err(VaultError::Config(
                "Refusing to delete without confirmation; pass --yes".into(),
            ));
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete {} record(s) under '{}' and rebuild the index?",
                matching, topic
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::Config(format!("Confirmation prompt failed: {}", e)))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let deleted = ctx.store.delete_topic(topic, &ctx.profile)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "deleted": deleted,
            "removed": if deleted { matching } else { 0 },
            "remaining": ctx.store.records(&ctx.profile)?.len(),
        }));
    }

    if deleted {
        println!(
            "{} Removed {} record(s) under '{}'; index rebuilt.",
            "Deleted".green().bold(),
            matching,
            topic
        );
    } else {
        println!("{} No records for topic '{}'.", "Not found:".yellow(), topic);
    }
    Ok(())
}
