//! Aggregate figures shown above the order list and on the dashboard.

use serde::{Deserialize, Serialize};

use crate::types::{Customer, Order, OrderStatus};

/// Order counts per status and the revenue they add up to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Sum of `totalAmount` over every order, whatever its status.
    pub total_revenue: f64,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(
            Self {
                total_orders: orders.len(),
                ..Self::default()
            },
            |mut stats, order| {
                match order.status {
                    OrderStatus::Pending => stats.pending += 1,
                    OrderStatus::Processing => stats.processing += 1,
                    OrderStatus::Shipped => stats.shipped += 1,
                    OrderStatus::Delivered => stats.delivered += 1,
                    OrderStatus::Cancelled => stats.cancelled += 1,
                }
                if order.total_amount.is_finite() {
                    stats.total_revenue += order.total_amount;
                }
                stats
            },
        )
    }
}

/// Headline totals for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub customers: usize,
    pub orders: usize,
    pub active_segments: usize,
    pub total_revenue: f64,
}

impl DashboardTotals {
    /// Every stored segment counts as active.
    pub fn new(customers: &[Customer], orders: &[Order], segments: usize) -> Self {
        Self {
            customers: customers.len(),
            orders: orders.len(),
            active_segments: segments,
            total_revenue: OrderStats::from_orders(orders).total_revenue,
        }
    }
}
