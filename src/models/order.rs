//! Order and demand models.
//!
//! An order asks for a quantity of one material inside a time window.
//! A demand groups the orders of one planning request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Material;

/// A demand line item.
///
/// # Time Representation
/// Windows are absolute UTC instants. They are mapped to the solver's
/// integer domain through a [`Pivot`](super::Pivot) at ignition time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order code.
    pub code: String,
    /// Material to produce. Candidate recipes are looked up by its code.
    pub material: Material,
    /// Requested quantity (>= 0).
    pub quantity: f64,
    /// Priority in [0, 100] (higher = more important).
    pub priority: i32,
    /// Earliest start of any step of this order.
    pub start_at: DateTime<Utc>,
    /// Latest end of any step of this order.
    pub end_at: DateTime<Utc>,
    /// Domain-specific key-value metadata.
    pub attributes: HashMap<String, String>,
}

impl Order {
    /// Creates an order for `material` within `[start_at, end_at]`.
    pub fn new(
        code: impl Into<String>,
        material: Material,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            material,
            quantity: 0.0,
            priority: 0,
            start_at,
            end_at,
            attributes: HashMap::new(),
        }
    }

    /// Sets the requested quantity.
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A named collection of orders with its own window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    /// Unique demand code.
    pub code: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub orders: Vec<Order>,
}

impl Demand {
    pub fn new(code: impl Into<String>, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            start_at,
            end_at,
            orders: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// Finds an order by code.
    pub fn order(&self, code: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.code == code)
    }

    /// Number of orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
