//! hfs-es-query
//!
//! Prints the Elasticsearch search body compiled from a FHIR search.
//!
//! ```text
//! hfs-es-query --registry search-parameters.json Patient 'family=Smith,Jones&_sort=-birthdate'
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HFS_ES_REGISTRY` | | Search parameter definitions (JSON) |
//! | `HFS_ES_BASE_URL` | | Server base URL for reference matching |
//! | `HFS_ES_LOG_LEVEL` | info | Log level |

use anyhow::Context;
use clap::Parser;
use helios_search_es::{
    CompilerConfig, EsTypeQueryBuilder, InMemorySearchParameterRegistry, Query, QueryCompiler,
    SearchRequest, build_sort_for_request,
};
use serde_json::{Value, json};
use tracing::info;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "hfs-es-query")]
#[command(about = "Compile a FHIR search into an Elasticsearch query")]
struct Args {
    /// Path to the search parameter definitions file.
    #[arg(short, long, env = "HFS_ES_REGISTRY")]
    registry: std::path::PathBuf,

    /// Resource type being searched (e.g. Patient).
    resource_type: String,

    /// Query string, e.g. `name=Smith&birthdate=ge1990`.
    #[arg(default_value = "")]
    query: String,

    /// Server base URL, used to relate absolute and relative references.
    #[arg(long, env = "HFS_ES_BASE_URL")]
    base_url: Option<String>,

    /// Additional filter clause as JSON; may be repeated.
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Extra parameters to skip, besides the standard result parameters.
    #[arg(long = "skip", value_delimiter = ',')]
    skip: Vec<String>,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "HFS_ES_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initializes logging to stderr, leaving stdout for the query.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("helios_search_es={},hfs_es_query={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_filters(raw: &[String]) -> anyhow::Result<Vec<Query>> {
    raw.iter()
        .map(|f| {
            serde_json::from_str::<Value>(f)
                .map(Query::from)
                .with_context(|| format!("Invalid filter JSON: {}", f))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let registry = InMemorySearchParameterRegistry::from_json_file(&args.registry)
        .with_context(|| format!("Failed to load registry {}", args.registry.display()))?;
    info!(
        params = registry.len(),
        resource_types = registry.resource_types().len(),
        "Loaded search parameter registry"
    );

    let mut config = CompilerConfig::default();
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    for name in &args.skip {
        config = config.with_non_searchable(name.clone());
    }

    let builder = EsTypeQueryBuilder::from_config(&config);
    let request = SearchRequest::from_query_string(args.resource_type.clone(), &args.query);
    let filters = parse_filters(&args.filters)?;

    let query = QueryCompiler::new(&registry, &builder, &config).compile(&request, filters)?;
    let sort = build_sort_for_request(&registry, &request)?;

    let mut body = json!({ "query": query });
    if !sort.is_empty() {
        body["sort"] = Value::Array(sort);
    }

    let output = if args.pretty {
        serde_json::to_string_pretty(&body)?
    } else {
        serde_json::to_string(&body)?
    };
    println!("{}", output);

    Ok(())
}
