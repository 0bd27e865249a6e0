use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, Instrument};

use cosmetics_catalog::app_system::{setup_tracing, CatalogSystem};
use cosmetics_catalog::clients::CatalogClient;
use cosmetics_catalog::config::CatalogConfig;
use cosmetics_catalog::domain::{ProductDraft, ProductId};
use cosmetics_catalog::query::{project, StockFilter};

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Browse and edit the cosmetics product catalog")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use the built-in sample store instead of the remote one
    #[arg(long)]
    local: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the catalog
    List {
        /// Case-insensitive name filter
        #[arg(long, default_value = "")]
        search: String,
        /// all, inStock or outOfStock
        #[arg(long, default_value = "all")]
        filter: StockFilter,
    },
    /// Add a product
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        price: String,
    },
    /// Remove a product
    Remove { id: String },
    /// Set a product's price
    Price { id: String, price: String },
    /// Flip a product's stock status
    Toggle { id: String },
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    let config = CatalogConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let system = if cli.local {
        CatalogSystem::local(&config)
    } else {
        CatalogSystem::http(&config).map_err(|e| e.to_string())?
    };

    let span = tracing::info_span!("initial_load");
    async {
        match system.client.load().await {
            Ok(count) => info!(count, "Catalog loaded"),
            Err(e) => error!(error = %e, "Could not load catalog"),
        }
    }
    .instrument(span)
    .await;

    let outcome = run(&system.client, cli.command).await;

    system.shutdown().await?;
    outcome
}

async fn run(client: &CatalogClient, command: Command) -> Result<(), String> {
    let (search, filter) = match command {
        Command::List { search, filter } => (search, filter),
        Command::Add { name, image, price } => {
            let product = client
                .add(&ProductDraft::new(name, image, price))
                .await
                .map_err(|e| e.to_string())?;
            info!(product_id = %product.id, "Product added");
            (String::new(), StockFilter::All)
        }
        Command::Remove { id } => {
            match client.remove(ProductId::new(id)).await.map_err(|e| e.to_string())? {
                Some(product) => info!(product_id = %product.id, "Product removed"),
                None => info!("No such product"),
            }
            (String::new(), StockFilter::All)
        }
        Command::Price { id, price } => {
            let updated = client
                .update_price(ProductId::new(id), price)
                .await
                .map_err(|e| e.to_string())?;
            if updated.is_none() {
                info!("No such product");
            }
            (String::new(), StockFilter::All)
        }
        Command::Toggle { id } => {
            let toggled = client
                .toggle_stock(ProductId::new(id))
                .await
                .map_err(|e| e.to_string())?;
            if toggled.is_none() {
                info!("No such product");
            }
            (String::new(), StockFilter::All)
        }
    };

    print_catalog(client, &search, filter);
    Ok(())
}

fn print_catalog(client: &CatalogClient, search: &str, filter: StockFilter) {
    let state = client.state();
    let visible = project(&state.products, search, filter);
    if visible.is_empty() {
        println!("No products found.");
        return;
    }
    for product in visible {
        let stock = if product.in_stock { "In stock" } else { "Out of stock" };
        let marker = if state.is_divergent(&product.id) { " (unsynced)" } else { "" };
        println!("{:>8}  {:<24} ${:<8} {}{}", product.id, product.name, product.price, stock, marker);
    }
}
