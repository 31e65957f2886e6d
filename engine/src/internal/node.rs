//! Resource-node instances.

use crate::public::catalogue::DecayStart;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNodeInstance {
    pub id: String,
    pub prototype_id: String,
    pub produces: String,
    pub rate_by_entity_type: HashMap<String, f64>,
    pub max_workers: Option<u32>,
    pub remaining_stock: Option<f64>,
    pub decay_rate_per_second: Option<f64>,
    pub decay_start: Option<DecayStart>,
    pub decay_active: bool,
    pub depleted: bool,
    pub tags: Vec<String>,
}

impl ResourceNodeInstance {
    pub fn base_rate_for(&self, entity_type: &str) -> f64 {
        self.rate_by_entity_type.get(entity_type).copied().unwrap_or(0.0)
    }

    pub fn at_capacity(&self, current_workers: usize) -> bool {
        matches!(self.max_workers, Some(cap) if current_workers >= cap as usize)
    }
}
