use std::path::Path;

use anyhow::Context as _;
use crm_api_client::envelope::list_from_envelope;
use crm_api_client::CrmClient;
use crm_core::config::AppConfig;
use crm_core::types::{CampaignKind, CampaignSend, Customer, NewCustomer, NewOrder, OrderStatus};
use crm_core::{CrmError, CrmResult, DashboardTotals, OrderStats, RecordId};
use crm_segmentation::{FilterResult, RuleEvaluator, RuleSet, RuleSetDraft, SegmentBuilder};
use tracing::info;

/// Everything a command needs: the loaded config and a client built from it.
pub struct Context {
    config: AppConfig,
    client: CrmClient,
}

impl Context {
    pub fn new(config: AppConfig) -> CrmResult<Self> {
        let client = CrmClient::new(&config.api)?;
        Ok(Self { config, client })
    }

    fn evaluator(&self) -> RuleEvaluator {
        RuleEvaluator::from_config(&self.config.segmentation)
    }
}

pub async fn list_customers(ctx: &Context, rules: Option<&Path>) -> CrmResult<()> {
    let customers = ctx.client.fetch_customers().await?;
    let customers = match rules {
        Some(path) => ctx.evaluator().preview(&customers, &read_rules(path)?)?,
        None => {
            let total = customers.len();
            FilterResult::new(customers, total, &RuleSet::default())
        }
    };

    print_summary(&customers);
    for c in &customers.customers {
        println!(
            "{}\t{}\t{}\t{:.2}\t{}\t{}",
            c.id,
            c.name,
            c.email,
            c.spend(),
            c.visit_count(),
            c.last_active
                .map(|ts| ts.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    Ok(())
}

pub async fn add_customer(
    ctx: &Context,
    name: String,
    email: String,
    total_spend: f64,
    visits: u64,
) -> CrmResult<()> {
    let customer = NewCustomer {
        total_spend,
        visits,
        ..NewCustomer::new(name.trim(), email.trim())
    };
    if !customer.is_complete() {
        return Err(CrmError::Validation(
            "customer name and email are required".to_string(),
        ));
    }
    let created = ctx.client.create_customer(&customer).await?;
    println!("Customer {} created ({})", created.name, created.id);
    Ok(())
}

pub async fn list_orders(ctx: &Context) -> CrmResult<()> {
    let orders = ctx.client.fetch_orders().await?;
    let stats = OrderStats::from_orders(&orders);
    println!(
        "Orders: {}  Delivered: {}  Pending: {}  Processing: {}  Revenue: {:.2}",
        stats.total_orders, stats.delivered, stats.pending, stats.processing, stats.total_revenue
    );
    for order in &orders {
        let items: Vec<String> = order
            .items
            .iter()
            .map(|i| format!("{} x{} @ {:.2}", i.product, i.quantity, i.price))
            .collect();
        println!(
            "{}\t{}\t{}\t{:.2}\t{}",
            order.id,
            order.customer.id(),
            order.status.as_str(),
            order.total_amount,
            items.join(", ")
        );
    }
    Ok(())
}

pub async fn add_order(
    ctx: &Context,
    customer: String,
    product: &str,
    price: f64,
    quantity: u32,
) -> CrmResult<()> {
    if product.trim().is_empty() || !price.is_finite() || price < 0.0 {
        return Err(CrmError::Validation(
            "order needs a product and a non-negative price".to_string(),
        ));
    }
    let order = NewOrder::single(RecordId::new(customer), product.trim(), price, quantity);
    let created = ctx.client.create_order(&order).await?;
    println!(
        "Order {} created: {:.2} ({})",
        created.id,
        created.total_amount,
        created.status.as_str()
    );
    Ok(())
}

pub async fn update_order(ctx: &Context, id: &str, status: OrderStatus) -> CrmResult<()> {
    let order = ctx.client.update_order_status(id, status).await?;
    println!("Order {} is now {}", order.id, order.status.as_str());
    Ok(())
}

pub async fn list_segments(ctx: &Context) -> CrmResult<()> {
    let segments = ctx.client.fetch_segments().await?;
    let now = ctx.evaluator().now();
    if segments.is_empty() {
        println!("No segments found.");
    }
    for segment in &segments {
        let size = segment
            .audience_size()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let rules = segment
            .rule_set(now)
            .map(|rs| {
                let labels: Vec<String> = rs.rules.iter().map(|r| r.label()).collect();
                format!("{} ({:?})", labels.join(", "), rs.logic)
            })
            .unwrap_or_else(|| {
                if segment.rules.is_null() {
                    String::new()
                } else {
                    "unreadable rules".to_string()
                }
            });
        println!(
            "{}\t{}\t{}\t{}\t{}",
            segment.id,
            segment.name,
            size,
            segment.created_by.as_deref().unwrap_or("Unknown"),
            rules
        );
    }
    Ok(())
}

pub async fn preview(
    ctx: &Context,
    rules: &Path,
    customers: Option<&Path>,
) -> CrmResult<()> {
    let draft = read_rules(rules)?;
    let customers = match customers {
        Some(path) => read_customers(path)?,
        None => ctx.client.fetch_customers().await?,
    };

    let result = ctx.evaluator().preview(&customers, &draft)?;
    print_summary(&result);
    println!("Audience Size: {} customers", result.count);
    Ok(())
}

pub async fn create_segment(
    ctx: &Context,
    name: &str,
    description: &str,
    rules: &Path,
    created_by: Option<String>,
) -> CrmResult<()> {
    let mut builder = SegmentBuilder::new(name)
        .description(description)
        .rules(read_rules(rules)?);
    if let Some(actor) = created_by {
        builder = builder.created_by(actor);
    }
    let new_segment = builder.build()?;

    let segment = ctx.client.create_segment(&new_segment).await?;
    info!(segment_id = %segment.id, "Segment created");
    println!("Segment \"{}\" created ({})", segment.name, segment.id);
    Ok(())
}

pub async fn list_campaigns(ctx: &Context) -> CrmResult<()> {
    let campaigns = ctx.client.fetch_campaigns().await?;
    if campaigns.is_empty() {
        println!("No campaigns found.");
    }
    for campaign in &campaigns {
        println!(
            "{}\t{}\t{}\tsent {}\tfailed {}",
            campaign.id, campaign.title, campaign.status, campaign.sent, campaign.failed
        );
    }
    Ok(())
}

pub async fn send_campaign(
    ctx: &Context,
    segment: String,
    name: String,
    kind: CampaignKind,
    message: String,
) -> CrmResult<()> {
    if message.trim().is_empty() {
        return Err(CrmError::Validation(
            "campaign message must not be empty".to_string(),
        ));
    }
    let result = ctx
        .client
        .send_campaign(&CampaignSend {
            name,
            kind,
            segment_id: RecordId::new(segment),
            message,
        })
        .await?;
    println!(
        "Campaign sent. Sent: {} Failed: {} Recipients: {}",
        result.sent_count,
        result.failed_count,
        result.recipients.len()
    );
    Ok(())
}

pub async fn dashboard(ctx: &Context) -> CrmResult<()> {
    let (customers, orders, segments) = tokio::try_join!(
        ctx.client.fetch_customers(),
        ctx.client.fetch_orders(),
        ctx.client.fetch_segments(),
    )?;
    let totals = DashboardTotals::new(&customers, &orders, segments.len());
    info!(
        customers = totals.customers,
        orders = totals.orders,
        segments = totals.active_segments,
        "Dashboard totals computed"
    );
    println!("Total Customers: {}", totals.customers);
    println!("Total Orders: {}", totals.orders);
    println!("Active Segments: {}", totals.active_segments);
    println!("Total Revenue: {:.2}", totals.total_revenue);
    Ok(())
}

pub async fn health(ctx: &Context) -> CrmResult<()> {
    let status = ctx.client.health().await;
    println!("{} (status {})", status.message, status.status);
    if !status.connected {
        return Err(CrmError::Api(format!(
            "API at {} is not reachable",
            ctx.client.base_url()
        )));
    }
    Ok(())
}

fn print_summary(result: &FilterResult) {
    println!("Customers ({})", result.headline());
    if result.has_active_filters() {
        let labels: Vec<&str> = result
            .active_filters
            .iter()
            .map(|f| f.label.as_str())
            .collect();
        println!("Active filters: {}", labels.join(", "));
    }
}

fn read_rules(path: &Path) -> CrmResult<RuleSetDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules from {}", path.display()))?;
    let draft = serde_json::from_str(&raw)
        .with_context(|| format!("invalid rule file {}", path.display()))?;
    Ok(draft)
}

fn read_customers(path: &Path) -> CrmResult<Vec<Customer>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read customers from {}", path.display()))?;
    let body = serde_json::from_str(&raw)
        .with_context(|| format!("invalid customer file {}", path.display()))?;
    Ok(list_from_envelope(body, "customers")?)
}
