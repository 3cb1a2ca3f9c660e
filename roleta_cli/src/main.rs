use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::{io::Write, path::Path};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use roleta_core::{Promotion, PromotionStore, SeedLedger, Session};
use roleta_store::{HttpStore, SqliteStore};

#[derive(Parser)]
#[command(name = "roleta-cli", about = "Admin CLI for roleta promotions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Database URL, default sqlite://roleta.db
    #[arg(long, value_parser, env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Base url of a running server; takes precedence over the database
    #[arg(long, env = "ROLETA_SERVER")]
    server: Option<String>,
    /// Bearer token for the server's operator endpoints
    #[arg(long, env = "API_KEY", default_value = "dev-key", hide_env_values = true)]
    token: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List promotions in creation order
    List {
        #[arg(default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print a promotion as JSON
    Show { slug: String },
    /// Create a promotion from the starter template
    New { slug: String, title: String },
    /// Create a promotion from a JSON file
    Import { path: String },
    /// Replace a promotion with the contents of a JSON file
    Update { slug: String, path: String },
    /// Copy a promotion under a fresh slug
    Duplicate { slug: String },
    Delete { slug: String },
    /// Upload an image and print its url
    Upload {
        path: String,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Write a promotion's option table to CSV
    ExportCsv { slug: String, path: String },
    /// Spin a wheel on the server
    Spin {
        slug: String,
        #[arg(long)]
        client_seed: Option<String>,
    },
    /// Rotate server seed to a new secret
    RotateSeed { new_seed: String },
}

enum Backend {
    Sqlite(SqliteStore),
    Http(HttpStore),
}

impl Backend {
    async fn open(cli: &Cli) -> anyhow::Result<Self> {
        if let Some(url) = &cli.server {
            debug!(%url, "using http backend");
            return Ok(Backend::Http(HttpStore::new(url.clone())));
        }
        let url = cli.database_url.clone().unwrap_or_else(|| "sqlite://roleta.db".into());
        debug!(%url, "using sqlite backend");
        let store = SqliteStore::connect(&url, "").await.context("opening database")?;
        Ok(Backend::Sqlite(store))
    }

    fn store(&self) -> &dyn PromotionStore {
        match self {
            Backend::Sqlite(s) => s,
            Backend::Http(h) => h,
        }
    }
}

fn read_promotion(path: &str) -> anyhow::Result<Promotion> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

fn guess_content_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn write_options_csv<W: Write>(wtr: &mut csv::Writer<W>, promotion: &Promotion) -> anyhow::Result<()> {
    wtr.write_record(["index", "text", "weight", "probability", "color", "configured"])?;
    let probabilities = promotion.probabilities();
    for (i, option) in promotion.options.iter().enumerate() {
        wtr.write_record(&[
            i.to_string(),
            option.text.clone(),
            option.weight.to_string(),
            format!("{:.4}", probabilities[i]),
            option.color.clone(),
            option.is_configured().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = Backend::open(&cli).await?;
    let store = backend.store();
    let session = Session::new(cli.token.clone());

    match cli.command {
        Commands::List { limit, offset } => {
            for s in store.list(&session, limit, offset).await? {
                println!(
                    "{:<24} {:<32} {} [{}]",
                    s.slug,
                    s.title,
                    s.created_at.to_rfc3339(),
                    s.prize_list.join(", ")
                );
            }
        }
        Commands::Show { slug } => {
            let promotion = store.get(&slug).await?;
            println!("{}", serde_json::to_string_pretty(&promotion)?);
        }
        Commands::New { slug, title } => {
            let slug = store.create(&session, Promotion::starter(slug, title)).await?;
            println!("Created {slug}");
        }
        Commands::Import { path } => {
            let slug = store.create(&session, read_promotion(&path)?).await?;
            println!("Created {slug}");
        }
        Commands::Update { slug, path } => {
            let slug = store.update(&session, &slug, read_promotion(&path)?).await?;
            println!("Updated {slug}");
        }
        Commands::Duplicate { slug } => {
            let copy = store.duplicate(&session, &slug).await?;
            println!("Duplicated {slug} as {copy}");
        }
        Commands::Delete { slug } => {
            store.delete(&session, &slug).await?;
            println!("Deleted {slug}");
        }
        Commands::Upload { path, content_type } => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&path).to_string());
            let url = store.upload_asset(&session, bytes, &content_type).await?;
            println!("{url}");
        }
        Commands::ExportCsv { slug, path } => {
            let promotion = store.get(&slug).await?;
            let mut wtr = csv::Writer::from_path(&path)?;
            write_options_csv(&mut wtr, &promotion)?;
            println!("Exported {} options to {}", promotion.options.len(), path);
        }
        Commands::Spin { slug, client_seed } => {
            let Backend::Http(remote) = &backend else {
                bail!("spin needs --server; draws are committed by the server's seed ledger");
            };
            let promotion = remote.get(&slug).await?;
            let spin = remote.spin(&slug, client_seed.as_deref()).await?;
            let prize = promotion
                .options
                .get(spin.result)
                .map(|o| o.text.as_str())
                .unwrap_or("?");
            println!(
                "result={} prize={} nonce={} client_seed={} server_seed_hash={}",
                spin.result, prize, spin.nonce, spin.client_seed, spin.server_seed_hash
            );
        }
        Commands::RotateSeed { new_seed } => {
            let Backend::Sqlite(db) = &backend else {
                bail!("rotate-seed works against the database only");
            };
            let hash = db.rotate(&new_seed).await?;
            println!("Rotated server seed. New hash: {}", hash);
        }
    }

    Ok(())
}
