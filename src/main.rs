use anyhow::Context;
use clap::Parser;
use sift::{Config, FixedUnderstanding, MeiliIndex, MemoryIndex, SearchFacade, SearchIndex, SearchOptions, Vocabulary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sift", about = "Multi-term product search over a faceted index")]
struct Cli {
    /// Emit debug logs on stderr (RUST_LOG overrides the level).
    #[arg(long)]
    debug: bool,

    /// Config file layered over the built-in defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Search a JSON array of documents in memory instead of the HTTP index.
    #[arg(long, value_name = "FILE")]
    documents: Option<PathBuf>,

    /// Expanded search term; repeat for a multi-term search.
    #[arg(long = "term", value_name = "T")]
    terms: Vec<String>,

    /// Understanding answer (JSON) to expand the query with.
    #[arg(long, value_name = "FILE", conflicts_with = "terms")]
    expand_file: Option<PathBuf>,

    /// Page size; defaults to `search.default_limit`.
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,

    /// Index filter expression, e.g. `brand = "acme" AND price < 100`.
    #[arg(long)]
    filter: Option<String>,

    /// Sort key `attr:asc|desc`; repeatable.
    #[arg(long = "sort", value_name = "KEY")]
    sort: Vec<String>,

    #[arg(long)]
    highlight: bool,

    /// Overall deadline in milliseconds.
    #[arg(long, value_name = "N")]
    deadline_ms: Option<u64>,

    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    sift::init_tracing(cli.debug);

    let config = Config::load(cli.config.as_deref())?;
    let index: Arc<dyn SearchIndex> = match &cli.documents {
        Some(path) => {
            let index = MemoryIndex::from_json_file(path)
                .with_context(|| format!("loading documents from {}", path.display()))?;
            tracing::debug!(documents = index.len(), "main: using in-memory index");
            Arc::new(index)
        }
        None => Arc::new(MeiliIndex::new(&config.index)?),
    };
    let facade = SearchFacade::new(index, &config);

    let options = SearchOptions {
        limit: cli.limit.unwrap_or(config.search.default_limit as i64),
        offset: cli.offset,
        filter: cli.filter,
        sort: cli.sort,
        highlighting: cli.highlight,
        use_expansion: cli.expand_file.is_some(),
        deadline: cli.deadline_ms.map(Duration::from_millis),
    };

    let response = match &cli.expand_file {
        Some(path) => {
            let understanding = FixedUnderstanding::from_json_file(path)
                .with_context(|| format!("loading understanding from {}", path.display()))?;
            facade
                .search_with_expansion(&cli.query, &understanding, &Vocabulary::default(), &options)
                .await?
        }
        None => facade.search(&cli.query, &cli.terms, &options).await?,
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
