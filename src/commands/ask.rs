use colored::Colorize;

use knowledge_vault::error::Result;
use knowledge_vault::retrieval::RetrievalFacade;

use super::{print_json, truncate_text, Context};

pub fn cmd_ask(ctx: &mut Context, question: &str) -> Result<()> {
    let answer = RetrievalFacade::new(&mut ctx.store).answer(question, &ctx.profile)?;

    if ctx.json {
        return print_json(&answer);
    }

    println!("{} {}\n", "Q:".cyan().bold(), question);
    println!("{} {}", "A:".green().bold(), answer.answer);

    if !answer.topic.is_empty() {
        println!(
            "\n  {} {} {}",
            "from".dimmed(),
            answer.topic.cyan(),
            format!("({})", answer.source).dimmed()
        );
    }
    if ctx.verbose && !answer.context.is_empty() {
        println!("\n  {}", truncate_text(&answer.context, 400).dimmed());
    }
    Ok(())
}

pub fn cmd_timeline(ctx: &mut Context) -> Result<()> {
    let entries = RetrievalFacade::new(&mut ctx.store).timeline(&ctx.profile)?;

    if ctx.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!(
            "{} Profile '{}' is empty.",
            "Not found:".yellow(),
            ctx.profile
        );
        return Ok(());
    }

    println!("{} for '{}':\n", "Timeline".green().bold(), ctx.profile);
    for entry in &entries {
        println!(
            "  {} {} {}",
            entry.date.dimmed(),
            entry.topic.cyan(),
            format!("[{}]", entry.source).dimmed()
        );
        println!("    {}", truncate_text(&entry.preview, 110));
    }
    Ok(())
}

pub fn cmd_themes(ctx: &mut Context, query: &str, top_k: Option<usize>) -> Result<()> {
    let top_k = top_k.unwrap_or(ctx.config.default_top_k);
    let themes = RetrievalFacade::new(&mut ctx.store).themes(query, top_k, &ctx.profile)?;

    if ctx.json {
        return print_json(&themes);
    }

    if themes.is_empty() {
        println!(
            "{} Nothing stored in profile '{}' yet.",
            "Not found:".yellow(),
            ctx.profile
        );
        return Ok(());
    }

    let sources: usize = themes.iter().map(|t| t.hits.len()).sum();
    println!(
        "{} {} source(s) across {} theme(s) for '{}'\n",
        "Themes".green().bold(),
        sources,
        themes.len(),
        query
    );
    for (i, theme) in themes.iter().enumerate() {
        println!("  {} {}", format!("Theme {}:", i + 1).bold(), theme.topic.cyan());
        for hit in &theme.hits {
            println!(
                "    {} {} {}",
                ">".green(),
                hit.record.source.dimmed(),
                hit.record.date_string().dimmed()
            );
            println!("      {}", truncate_text(&hit.record.content, 500));
        }
        println!();
    }
    Ok(())
}
