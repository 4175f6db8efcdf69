use colored::Colorize;

use knowledge_vault::error::Result;

use super::{print_json, Context};

pub fn cmd_profiles(ctx: &mut Context, create: Option<String>) -> Result<()> {
    if let Some(name) = create {
        let profile = ctx.store.create_profile(&name)?;
        if ctx.json {
            return print_json(&serde_json::json!({ "created": profile }));
        }
        println!("{} profile '{}'", "Created".green().bold(), profile);
        return Ok(());
    }

    let profiles = ctx.store.list_profiles()?;
    if ctx.json {
        return print_json(&profiles);
    }

    for profile in &profiles {
        let marker = if *profile == ctx.profile {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}", marker, profile);
    }
    Ok(())
}

pub fn cmd_reindex(ctx: &mut Context) -> Result<()> {
    if !ctx.json {
        println!(
            "{} Re-embedding profile '{}' with {}...",
            "Reindex".green().bold(),
            ctx.profile,
            ctx.store.embedder().name()
        );
    }

    let count = ctx.store.reindex(&ctx.profile)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "reindexed": count }));
    }
    println!("{} {} record(s) re-embedded.", "Done!".green().bold(), count);
    Ok(())
}

pub fn cmd_check(ctx: &mut Context) -> Result<()> {
    let health = ctx.store.check(&ctx.profile);

    if ctx.json {
        print_json(&health)?;
    } else {
        let size = |bytes: Option<u64>| match bytes {
            Some(b) => humansize::format_size(b, humansize::BINARY),
            None => "missing".to_string(),
        };
        let count = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_else(|| "?".into());

        println!("{} profile '{}'", "Check".green().bold(), health.profile);
        println!("  Directory: {}", health.dir.display());
        println!("  Index:     {}", size(health.index_bytes));
        println!("  Metadata:  {}", size(health.metadata_bytes));
        println!("  Records:   {}", count(health.records));
        println!("  Vectors:   {}", count(health.vectors));
        println!("  Topics:    {}", count(health.topics));

        match &health.problem {
            None => println!("  {} consistent", "✓".green()),
            Some(problem) => println!("  {} {}", "✗".red(), problem),
        }
    }

    if !health.is_healthy() {
        std::process::exit(1);
    }
    Ok(())
}
