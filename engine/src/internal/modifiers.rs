//! Numeric modifiers and the deterministic key shapes they match against
//!.

use crate::public::catalogue::{ModifierOp, NumericModifier};

pub fn key_action_duration(action_id: &str) -> String {
    format!("action.duration.{action_id}")
}

pub fn key_action_cost(action_id: &str, resource: &str) -> String {
    format!("action.cost.{action_id}.{resource}")
}

pub fn key_gather_rate_node(prototype_id: &str) -> String {
    format!("gather.rate.node.{prototype_id}")
}

pub fn key_gather_rate_entity(entity_type: &str) -> String {
    format!("gather.rate.entity.{entity_type}")
}

pub fn key_gather_rate_tag(tag: &str) -> String {
    format!("gather.rate.tag.{tag}")
}

pub fn key_gather_stock_node(prototype_id: &str) -> String {
    format!("gather.stock.node.{prototype_id}")
}

pub fn key_gather_stock_tag(tag: &str) -> String {
    format!("gather.stock.tag.{tag}")
}

pub fn key_market_fee(resource: Option<&str>) -> String {
    match resource {
        Some(r) => format!("market.fee.resource.{r}"),
        None => "market.fee".to_string(),
    }
}

fn apply_op(value: f64, op: ModifierOp, operand: f64) -> f64 {
    match op {
        ModifierOp::Mul => value * operand,
        ModifierOp::Add => value + operand,
        ModifierOp::Set => operand,
    }
}

/// Apply every modifier whose `selector` exactly matches one of `keys`, in
/// the order the keys are given and, within a key, in the order the
/// modifiers were registered.
pub fn apply_modifiers(base: f64, keys: &[String], modifiers: &[NumericModifier]) -> f64 {
    let mut value = base;
    for key in keys {
        for m in modifiers.iter().filter(|m| &m.selector == key) {
            value = apply_op(value, m.op, m.value);
        }
    }
    value
}
