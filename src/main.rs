// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog CLI
//!
//! Command-line shell over the catalog client. Set CATALOG_API_URL and
//! CATALOG_UPLOAD_URL_ENDPOINT; the session is kept in CATALOG_PROFILE_DIR
//! (default `./.catalog-profile`) so a login survives between invocations.

use anyhow::Context;
use catalog_client::{
    config::Config,
    models::{Notification, ProductDraft, SelectedAsset, Severity},
    CatalogApp,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog", about = "Product catalog client")]
struct Cli {
    /// Emit JSON logs
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session in the profile directory
    Login { username: String, password: String },
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// List products
    Products,
    /// Show one product
    Product { id: u64 },
    /// Delete a product
    Delete { id: u64 },
    /// Create or update a product, optionally uploading an image
    Save {
        /// Existing product to update; omitted fields keep their current values
        #[arg(long)]
        id: Option<u64>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
        /// Keep this image reference when no file is given
        #[arg(long)]
        image_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if config.profile_dir.is_none() {
        config.profile_dir = Some(PathBuf::from(".catalog-profile"));
    }
    let app = CatalogApp::new(config).context("Failed to build client")?;

    let result = run(&app, cli.command).await;
    if let Some(notification) = app.notifier.current() {
        print_notification(&notification);
    }
    result
}

async fn run(app: &CatalogApp, command: Commands) -> anyhow::Result<()> {
    let catalog = &app.catalog;
    match command {
        Commands::Login { username, password } => {
            let identity = catalog.login(&username, &password).await?;
            print_json(&identity)
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            catalog.register(&username, &email, &password).await?;
            Ok(())
        }
        Commands::Logout => {
            catalog.logout();
            Ok(())
        }
        Commands::Whoami => match catalog.current_user() {
            Some(identity) => print_json(&identity),
            None => anyhow::bail!("Not logged in"),
        },
        Commands::Products => print_json(&catalog.list_products().await?),
        Commands::Product { id } => print_json(&catalog.get_product(id).await?),
        Commands::Delete { id } => {
            catalog.delete_product(id).await?;
            Ok(())
        }
        Commands::Save {
            id,
            name,
            price,
            description,
            image,
            image_url,
        } => {
            let mut upload = app.upload_pipeline();
            if let Some(path) = image {
                let asset = SelectedAsset::from_path(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                upload.select(asset)?;
            }

            let mut draft = match id {
                Some(id) => ProductDraft::from_product(&catalog.get_product(id).await?),
                None => ProductDraft {
                    name: name.clone().context("--name is required for a new product")?,
                    price: price.context("--price is required for a new product")?,
                    ..Default::default()
                },
            };
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(price) = price {
                draft.price = price;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if image_url.is_some() {
                draft.product_image_url = image_url;
            }

            let id = catalog.save_product(&draft, &mut upload).await?;
            print_json(&serde_json::json!({ "id": id }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_notification(notification: &Notification) {
    let label = match notification.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
        Severity::Info => "info",
    };
    eprintln!("[{}] {}", label, notification.message);
}

/// Initialize logging: compact text by default, JSON with `--json`.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,catalog_client=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
