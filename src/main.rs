//! weft CLI: build, query, and maintain similarity-linked knowledge graphs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use uuid::Uuid;

use weft::chunk::ChunkUpsert;
use weft::config::WeftConfig;
use weft::engine::{Engine, EngineConfig, IndexBackend};
use weft::graph::property::map_from_json;
use weft::scope::Scope;
use weft::similarity::EmbeddingDim;

#[derive(Parser)]
#[command(name = "weft", version, about = "Knowledge-graph engine for embedded text chunks")]
struct Cli {
    /// Data directory for persistent storage.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Optional weft.toml with default build/retrieve/prune settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Embedding dimension.
    #[arg(long, global = true, default_value = "1536")]
    dimension: usize,

    /// Use the HNSW index backend instead of the exact scan.
    #[arg(long, global = true)]
    hnsw: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new weft data directory.
    Init,

    /// Load pre-embedded chunks from a JSON file into a scope.
    Ingest {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        client: Uuid,
        /// JSON array of {document_id, chunk_index, content, embedding, …}.
        #[arg(long)]
        file: PathBuf,
    },

    /// Build (or refresh) the similarity graph for a scope.
    Build {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        client: Uuid,
        /// Restrict the build to one document.
        #[arg(long)]
        document: Option<Uuid>,
        /// Minimum cosine similarity for an edge.
        #[arg(long)]
        threshold: Option<f32>,
        /// Max edges kept per chunk.
        #[arg(long)]
        max_edges: Option<usize>,
        /// Hard cap on chunks per build.
        #[arg(long)]
        max_chunks: Option<usize>,
    },

    /// Retrieve content for a query embedding.
    Retrieve {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        client: Uuid,
        /// JSON file holding the query embedding (array of floats).
        #[arg(long)]
        query_file: PathBuf,
        /// Seed nodes from vector search.
        #[arg(long)]
        top_k: Option<usize>,
        /// Graph expansion hops (0 = vector only).
        #[arg(long)]
        hops: Option<usize>,
        /// Emit the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Archive stale graph elements and trim evidence.
    Prune {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        client: Uuid,
        #[arg(long)]
        edge_stale_days: Option<i64>,
        #[arg(long)]
        node_stale_days: Option<i64>,
        #[arg(long)]
        min_degree: Option<usize>,
    },

    /// Delete a document and cascade into its chunks, nodes, and edges.
    DeleteDocument {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        client: Uuid,
        #[arg(long)]
        document: Uuid,
    },

    /// Show engine info and statistics.
    Info,
}

/// One entry in an ingest file.
#[derive(serde::Deserialize)]
struct ChunkFileEntry {
    document_id: Uuid,
    chunk_index: u32,
    content: String,
    #[serde(default)]
    content_tokens: Option<u32>,
    #[serde(default)]
    page_start: Option<u32>,
    #[serde(default)]
    page_end: Option<u32>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = WeftConfig::load(cli.config.as_deref())?;

    let engine = Engine::new(EngineConfig {
        data_dir: cli.data_dir.clone(),
        embedding_dim: EmbeddingDim(cli.dimension),
        index_backend: if cli.hnsw {
            IndexBackend::Hnsw
        } else {
            IndexBackend::Exact
        },
        ..Default::default()
    })?;

    match cli.command {
        Commands::Init => {
            println!("initialized weft engine");
            println!("{}", engine.info());
        }

        Commands::Ingest { tenant, client, file } => {
            let text = std::fs::read_to_string(&file).into_diagnostic()?;
            let entries: Vec<ChunkFileEntry> = serde_json::from_str(&text).into_diagnostic()?;

            let upserts: Vec<ChunkUpsert> = entries
                .into_iter()
                .map(|entry| ChunkUpsert {
                    document_id: entry.document_id,
                    chunk_index: entry.chunk_index,
                    content: entry.content,
                    content_tokens: entry.content_tokens,
                    page_start: entry.page_start,
                    page_end: entry.page_end,
                    metadata: entry.metadata.map(map_from_json).unwrap_or_default(),
                    embedding: entry.embedding,
                })
                .collect();

            let ids = engine.upsert_chunks(Scope::new(tenant, client), upserts)?;
            println!("upserted {} chunks", ids.len());
        }

        Commands::Build {
            tenant,
            client,
            document,
            threshold,
            max_edges,
            max_chunks,
        } => {
            let mut config = file_config.build.clone();
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
            }
            if let Some(max_edges) = max_edges {
                config.max_edges_per_chunk = max_edges;
            }
            if let Some(max_chunks) = max_chunks {
                config.max_chunks = max_chunks;
            }

            let report = engine.build(Scope::new(tenant, client), document, &config)?;
            print!("{report}");
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
        }

        Commands::Retrieve {
            tenant,
            client,
            query_file,
            top_k,
            hops,
            json,
        } => {
            let text = std::fs::read_to_string(&query_file).into_diagnostic()?;
            let query: Vec<f32> = serde_json::from_str(&text).into_diagnostic()?;

            let mut config = file_config.retrieve.clone();
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(hops) = hops {
                config.hop_limit = hops;
            }

            let result = engine.retrieve(Scope::new(tenant, client), &query, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
            } else {
                println!(
                    "{} items (confidence {:.4}{})",
                    result.len(),
                    result.confidence,
                    if result.is_low_confidence() { ", LOW" } else { "" },
                );
                for item in &result.items {
                    let similarity = item
                        .similarity
                        .map_or_else(|| "      ".into(), |s| format!("{s:.4}"));
                    println!(
                        "  [{}] {} {} — {}",
                        item.provenance,
                        similarity,
                        item.node_key,
                        truncate(&item.content, 60),
                    );
                }
            }
        }

        Commands::Prune {
            tenant,
            client,
            edge_stale_days,
            node_stale_days,
            min_degree,
        } => {
            let mut config = file_config.prune.clone();
            if let Some(days) = edge_stale_days {
                config.edge_stale_days = days;
            }
            if let Some(days) = node_stale_days {
                config.node_stale_days = days;
            }
            if let Some(degree) = min_degree {
                config.min_degree = degree;
            }

            let report = engine.prune(Scope::new(tenant, client), &config)?;
            print!("{report}");
        }

        Commands::DeleteDocument {
            tenant,
            client,
            document,
        } => {
            let report = engine.delete_document(Scope::new(tenant, client), document)?;
            println!(
                "deleted {} chunks, {} nodes, {} edges",
                report.chunks_deleted, report.nodes_deleted, report.edges_deleted,
            );
        }

        Commands::Info => {
            print!("{}", engine.info());
        }
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
