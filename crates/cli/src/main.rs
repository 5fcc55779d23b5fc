//! Sartoria CLI - storefront from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Account
//! sartoria login -e ada@example.com -p secret1
//! sartoria register -f Ada -l Lovelace -e ada@example.com -p secret1 -c secret1
//! sartoria whoami
//! sartoria logout
//!
//! # Catalog
//! sartoria products --collection suits --size 40R --sort price-asc
//! sartoria collections
//!
//! # Cart and checkout
//! sartoria cart add -s two-piece-suit --size 40R -q 1
//! sartoria cart show
//! sartoria checkout
//! sartoria orders
//! ```
//!
//! # Environment Variables
//!
//! - `SARTORIA_API_URL` - Base URL of the backend API (required)
//! - `SARTORIA_DATA_DIR` - Where tokens and the cart are saved

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sartoria_storefront::{AppState, StorefrontConfig};

mod commands;

#[derive(Parser)]
#[command(name = "sartoria")]
#[command(author, version, about = "Sartoria storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account (and log in)
    Register {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Password confirmation
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Delete the saved session
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// List products, optionally filtered and sorted
    Products {
        /// Only products in this collection
        #[arg(long)]
        collection: Option<String>,

        /// Only products offering this size
        #[arg(long)]
        size: Option<String>,

        /// Only products in this color
        #[arg(long)]
        color: Option<String>,

        /// Inclusive lower price bound
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Inclusive upper price bound
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Sort order (`price-asc`, `price-desc`, `newest`)
        #[arg(long)]
        sort: Option<String>,
    },
    /// List collections
    Collections,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order from the current cart
    Checkout,
    /// Show order history
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product slug (as listed by `products`)
        #[arg(short, long)]
        slug: String,

        /// Size selector
        #[arg(long)]
        size: String,

        /// Quantity to add
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Show the cart contents and totals
    Show,
    /// Set the quantity of a cart line (0 removes it)
    Update {
        /// Product ID of the line
        #[arg(short, long)]
        product_id: i64,

        /// Size selector of the line
        #[arg(long)]
        size: String,

        /// New absolute quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Product ID of the line
        #[arg(short, long)]
        product_id: i64,

        /// Size selector of the line
        #[arg(long)]
        size: String,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let state = AppState::init(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&state, &email, &password).await?;
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            commands::auth::register(
                &state,
                &first_name,
                &last_name,
                &email,
                &password,
                &confirm_password,
            )
            .await?;
        }
        Commands::Logout => commands::auth::logout(&state),
        Commands::Whoami => commands::auth::whoami(&state).await,
        Commands::Products {
            collection,
            size,
            color,
            min_price,
            max_price,
            sort,
        } => {
            commands::catalog::products(
                &state,
                collection,
                size,
                color,
                min_price,
                max_price,
                sort.as_deref(),
            )
            .await?;
        }
        Commands::Collections => commands::catalog::collections(&state).await?,
        Commands::Cart { action } => match action {
            CartAction::Add {
                slug,
                size,
                quantity,
            } => commands::cart::add(&state, &slug, &size, quantity).await?,
            CartAction::Show => commands::cart::show(&state),
            CartAction::Update {
                product_id,
                size,
                quantity,
            } => commands::cart::update(&state, product_id, &size, quantity),
            CartAction::Remove { product_id, size } => {
                commands::cart::remove(&state, product_id, &size);
            }
            CartAction::Clear => commands::cart::clear(&state),
        },
        Commands::Checkout => commands::orders::checkout(&state).await?,
        Commands::Orders => commands::orders::history(&state).await?,
    }
    Ok(())
}
