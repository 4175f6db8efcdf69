mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

use knowledge_vault::config::{self, Config};
use knowledge_vault::error::Result;
use knowledge_vault::store::{KnowledgeStore, Profile};

use commands::ask::{cmd_ask, cmd_themes, cmd_timeline};
use commands::core::{cmd_add, cmd_delete, cmd_search, cmd_show, cmd_topics};
use commands::profiles::{cmd_check, cmd_profiles, cmd_reindex};
use commands::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir.as_deref() {
        config.data_dir = config::expand_path(dir)?;
    }
    let profile = match cli.profile.as_deref() {
        Some(name) => Profile::new(name)?,
        None => config.default_profile.clone(),
    };

    tracing::debug!(
        data_dir = %config.data_dir.display(),
        profile = %profile,
        "resolved configuration"
    );

    let mut ctx = Context {
        store: KnowledgeStore::with_default_embedder(config.data_dir.clone()),
        config,
        profile,
        json: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Add {
            topic,
            content,
            file,
            source,
        } => cmd_add(&mut ctx, &topic, content, file, &source),
        Commands::Search {
            query,
            top_k,
            exact,
        } => cmd_search(&mut ctx, &query, top_k, exact),
        Commands::Show { topic } => cmd_show(&mut ctx, &topic),
        Commands::Topics { counts, groups } => cmd_topics(&mut ctx, counts, groups),
        Commands::Delete { topic, yes } => cmd_delete(&mut ctx, &topic, yes),
        Commands::Ask { question } => cmd_ask(&mut ctx, &question),
        Commands::Timeline => cmd_timeline(&mut ctx),
        Commands::Themes { query, top_k } => cmd_themes(&mut ctx, &query, top_k),
        Commands::Profiles { create } => cmd_profiles(&mut ctx, create),
        Commands::Reindex => cmd_reindex(&mut ctx),
        Commands::Check => cmd_check(&mut ctx),
    }
}

/// Log to stderr so `--json` output on stdout stays parseable.
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "knowledge_vault=debug,kvault=debug"
    } else {
        "knowledge_vault=warn,kvault=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}
