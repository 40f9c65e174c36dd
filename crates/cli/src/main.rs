//! storecart CLI - a shopping cart persisted to a local storage file.
//!
//! # Usage
//!
//! ```bash
//! # Add a product, then a variant of another
//! storecart add pump-1 "Pump A"
//! storecart add pump-2 "Pump B" --attr capacity=40 --attr head=10
//!
//! # Adjust quantities by line key
//! storecart inc pump-1
//! storecart dec 'pump-2?capacity=40&head=10'
//!
//! # Inspect the cart
//! storecart list
//! storecart list --json
//! storecart count
//! storecart render
//!
//! # Build the WhatsApp order link
//! storecart checkout
//! ```
//!
//! # Commands
//!
//! - `init` - Create an empty cart if none is stored
//! - `add`, `inc`, `dec`, `remove`, `clear` - Cart mutations
//! - `list`, `count`, `render` - Read the cart
//! - `checkout` - Format the order and print its deep link
//!
//! Configuration is read from `STORECART_*` environment variables (see
//! `storecart_storefront::config`). Logs go to stderr, filtered by
//! `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storecart_core::{LineKey, ProductId};
use storecart_storefront::config::StorefrontConfig;
use storecart_storefront::error::{AppError, Result};
use storecart_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "storecart")]
#[command(author, version, about = "Shopping cart with WhatsApp checkout")]
struct Cli {
    /// Storage file, overriding `STORECART_STORAGE_PATH`
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty cart if none is stored
    Init,
    /// Add one unit of a product
    Add {
        /// Product identifier
        product_id: ProductId,

        /// Display name shown in the cart
        name: String,

        /// Variant attribute as `name=value`; repeatable
        #[arg(short, long = "attr", value_parser = commands::cart::parse_attribute)]
        attributes: Vec<(String, String)>,

        /// Image reference
        #[arg(short, long)]
        image: Option<String>,
    },
    /// Add one unit to an existing line
    Inc {
        /// Line key, as shown by `list`
        key: LineKey,
    },
    /// Take one unit off a line, removing it at zero
    Dec {
        /// Line key, as shown by `list`
        key: LineKey,
    },
    /// Remove a line regardless of quantity
    Remove {
        /// Line key, as shown by `list`
        key: LineKey,
    },
    /// Empty the cart
    Clear,
    /// List cart lines
    List {
        /// Print the persisted JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the total quantity
    Count,
    /// Print the rendered cart fragments
    Render {
        /// Surface to print; all when omitted
        #[arg(value_enum)]
        surface: Option<commands::view::Surface>,
    },
    /// Format the order and print its deep link
    Checkout {
        /// Print the order message as well as the link
        #[arg(long)]
        show_message: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(exit_code(&e));
    }
}

/// Process exit status for a failed command: 2 for bad input, 1 otherwise.
const fn exit_code(error: &AppError) -> i32 {
    if error.is_client_error() { 2 } else { 1 }
}

/// Initialize tracing on stderr, keeping stdout for command output.
fn init_tracing(json: bool) {
    // Defaults to warn, with info for the storefront, if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,storecart_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(path) = cli.storage {
        config.storage.path = path;
    }
    let state = AppState::open(config)?;

    match cli.command {
        Commands::Init => commands::cart::init(&state),
        Commands::Add {
            product_id,
            name,
            attributes,
            image,
        } => commands::cart::add(&state, product_id, name, attributes, image)?,
        Commands::Inc { key } => commands::cart::increment(&state, &key).await?,
        Commands::Dec { key } => commands::cart::decrement(&state, &key).await?,
        Commands::Remove { key } => commands::cart::remove(&state, &key)?,
        Commands::Clear => commands::cart::clear(&state)?,
        Commands::List { json } => commands::view::list(&state, json)?,
        Commands::Count => commands::view::count(&state),
        Commands::Render { surface } => commands::view::render(&state, surface),
        Commands::Checkout { show_message } => commands::checkout::run(&state, show_message)?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;
    use storecart_storefront::checkout::CheckoutError;
    use storecart_storefront::storage::StorageError;
    use storecart_storefront::store::StoreError;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_attributes() {
        let cli = Cli::try_parse_from([
            "storecart",
            "add",
            "pump-2",
            "Pump B",
            "--attr",
            "head=10",
            "-a",
            "capacity=40",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                product_id,
                attributes,
                image,
                ..
            } => {
                assert_eq!(product_id.as_str(), "pump-2");
                assert_eq!(
                    attributes,
                    vec![
                        ("head".to_string(), "10".to_string()),
                        ("capacity".to_string(), "40".to_string())
                    ]
                );
                assert!(image.is_none());
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Cli::try_parse_from(["storecart", "inc", "pump-1?head"]).is_err());
        assert!(Cli::try_parse_from(["storecart", "add", "  ", "Pump"]).is_err());
        assert!(Cli::try_parse_from(["storecart", "add", "pump-1", "Pump", "--attr", "head"]).is_err());
    }

    #[test]
    fn test_parse_global_storage() {
        let cli = Cli::try_parse_from(["storecart", "count", "--storage", "/tmp/cart.json"]).unwrap();
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/cart.json")));
        assert!(matches!(cli.command, Commands::Count));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(&AppError::BadRequest("bad attribute".to_string())), 2);
        assert_eq!(exit_code(&AppError::from(CheckoutError::EmptyCart)), 2);
        assert_eq!(
            exit_code(&AppError::from(StoreError::from(StorageError::Poisoned))),
            1
        );
    }
}
