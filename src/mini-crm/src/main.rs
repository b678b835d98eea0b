//! Mini CRM — customer, order and audience segment toolkit.
//!
//! Command-line entry point: loads configuration, wires the API client and
//! the rule evaluator, and runs one command.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crm_core::config::AppConfig;
use crm_core::types::{CampaignKind, OrderStatus};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mini-crm")]
#[command(about = "Customer, order and audience segment toolkit for the Mini CRM backend")]
#[command(version)]
struct Cli {
    /// API base URL (overrides config)
    #[arg(long, env = "MINI_CRM__API__BASE_URL")]
    base_url: Option<String>,

    /// Bearer token sent with API requests (overrides config)
    #[arg(long, env = "MINI_CRM__API__TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List customers, optionally narrowed by a rule file
    Customers {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Create a customer
    AddCustomer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 0.0)]
        total_spend: f64,
        #[arg(long, default_value_t = 0)]
        visits: u64,
    },
    /// List orders
    Orders,
    /// Create a single-item order
    AddOrder {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        product: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change the status of an order
    UpdateOrder {
        #[arg(long)]
        id: String,
        #[arg(long)]
        status: OrderStatus,
    },
    /// List segments with their audience sizes
    Segments,
    /// Validate a rule file and report the audience it selects
    Preview {
        #[arg(long)]
        rules: PathBuf,
        /// Read customers from a JSON file instead of the API
        #[arg(long)]
        customers: Option<PathBuf>,
    },
    /// Validate a rule file and create a segment from it
    CreateSegment {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        rules: PathBuf,
        /// Acting user recorded on the segment
        #[arg(long)]
        created_by: Option<String>,
    },
    /// List campaigns with delivery counts
    Campaigns,
    /// Send a campaign to a segment
    SendCampaign {
        #[arg(long)]
        segment: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "email")]
        kind: CampaignKind,
        #[arg(long)]
        message: String,
    },
    /// Show customer, order, segment and revenue totals
    Dashboard,
    /// Check API connectivity
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_crm=info,crm_api_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.api.token = Some(token);
    }

    info!(
        base_url = %config.api.base_url,
        authenticated = config.api.token.is_some(),
        "Configuration loaded"
    );

    let ctx = commands::Context::new(config)?;

    let outcome = match cli.command {
        Command::Customers { rules } => commands::list_customers(&ctx, rules.as_deref()).await,
        Command::AddCustomer {
            name,
            email,
            total_spend,
            visits,
        } => commands::add_customer(&ctx, name, email, total_spend, visits).await,
        Command::Orders => commands::list_orders(&ctx).await,
        Command::AddOrder {
            customer,
            product,
            price,
            quantity,
        } => commands::add_order(&ctx, customer, &product, price, quantity).await,
        Command::UpdateOrder { id, status } => commands::update_order(&ctx, &id, status).await,
        Command::Segments => commands::list_segments(&ctx).await,
        Command::Preview { rules, customers } => {
            commands::preview(&ctx, &rules, customers.as_deref()).await
        }
        Command::CreateSegment {
            name,
            description,
            rules,
            created_by,
        } => commands::create_segment(&ctx, &name, &description, &rules, created_by).await,
        Command::Campaigns => commands::list_campaigns(&ctx).await,
        Command::SendCampaign {
            segment,
            name,
            kind,
            message,
        } => commands::send_campaign(&ctx, segment, name, kind, message).await,
        Command::Dashboard => commands::dashboard(&ctx).await,
        Command::Health => commands::health(&ctx).await,
    };

    Ok(outcome?)
}
