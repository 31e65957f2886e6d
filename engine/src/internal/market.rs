//! The optional resource market.

use crate::internal::clock::EPS;
use crate::internal::state::SimState;
use crate::public::result::{CommandResultOutcome, ViolationCode};

/// Sell `amount` of `sell` for `buy` at the market's current exchange
/// rate, applying the configured fee, then nudge both resources' rates by
/// `rateStep` against the trader. A no-op (with a recorded
/// failure) if no market is configured, or if `sell` can't cover `amount`
/// without breaching its floor.
pub fn trade_resources(state: &mut SimState, sell: &str, buy: &str, amount: f64, source_command_index: usize) {
    let Some(market) = state.market.clone() else {
        state.warn(ViolationCode::InvalidAssignment, "tradeResources requires a configured market");
        state.record_command_result(
            source_command_index,
            CommandResultOutcome::Failed {
                message: "no market configured".to_string(),
            },
        );
        return;
    };

    if !state.entities.values().any(|e| e.entity_type == "market") {
        let message = "tradeResources requires at least one market-type entity".to_string();
        state.warn(ViolationCode::InvalidAssignment, message.clone());
        state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
        return;
    }

    if !market.config.base_rates.contains_key(sell) || !market.config.base_rates.contains_key(buy) {
        let message = format!("unsupported commodity in trade ({sell} -> {buy})");
        state.warn(ViolationCode::InvalidAssignment, message.clone());
        state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
        return;
    }

    let available = state.resources.get(sell).copied().unwrap_or(0.0);
    let floor = state.resource_floor(sell);
    if available - amount < floor - EPS {
        let message = format!("cannot sell {amount:.2} {sell}: only {available:.2} available above floor {floor:.2}");
        state.warn(ViolationCode::InsufficientResources, message.clone());
        state.record_command_result(source_command_index, CommandResultOutcome::Failed { message });
        return;
    }

    let base_sell = market.config.base_rates.get(sell).copied().unwrap_or(1.0);
    let base_buy = market.config.base_rates.get(buy).copied().unwrap_or(1.0);
    let adj_sell = market.rate_adjustments.get(sell).copied().unwrap_or(0.0);
    let adj_buy = market.rate_adjustments.get(buy).copied().unwrap_or(0.0);

    let mut rate = (base_sell + adj_sell) / (base_buy + adj_buy).max(EPS);
    if let Some(min) = market.config.min_exchange_rate {
        rate = rate.max(min);
    }
    if let Some(max) = market.config.max_exchange_rate {
        rate = rate.min(max);
    }

    let received = amount * rate * (1.0 - market.config.fee);

    state.charge_resource(sell, amount);
    state.grant_resource(buy, received);

    if let Some(market_mut) = state.market.as_mut() {
        *market_mut.rate_adjustments.entry(sell.to_string()).or_insert(0.0) -= market.config.rate_step;
        *market_mut.rate_adjustments.entry(buy.to_string()).or_insert(0.0) += market.config.rate_step;
    }

    state.record_command_result(
        source_command_index,
        CommandResultOutcome::Scheduled {
            completion_time: state.now,
            action_id: "tradeResources".to_string(),
            actors: vec![],
            started_at: state.now,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public::catalogue::{GameCatalogue, MarketConfig};
    use std::collections::HashMap;

    fn catalogue_with_market() -> GameCatalogue {
        GameCatalogue {
            resources: vec!["food".into(), "gold".into()],
            starting_resources: HashMap::new(),
            starting_entities: vec![],
            entities: HashMap::new(),
            resource_node_prototypes: HashMap::new(),
            starting_resource_nodes: vec![],
            starting_modifiers: vec![],
            task_efficiency: Default::default(),
            population: None,
            actions: HashMap::new(),
            market: Some(MarketConfig {
                fee: 0.3,
                min_exchange_rate: None,
                max_exchange_rate: None,
                rate_step: 0.01,
                base_rates: [("food".to_string(), 1.0), ("gold".to_string(), 1.0)].into_iter().collect(),
            }),
        }
    }

    #[test]
    fn sells_at_rate_minus_fee() {
        let catalogue = catalogue_with_market();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.create_entity("market");
        state.resources.insert("food".into(), 100.0);

        trade_resources(&mut state, "food", "gold", 100.0, 0);

        assert_eq!(*state.resources.get("food").unwrap(), 0.0);
        assert_eq!(*state.resources.get("gold").unwrap(), 70.0);
    }

    #[test]
    fn refuses_to_sell_below_floor() {
        let catalogue = catalogue_with_market();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.create_entity("market");
        state.resources.insert("food".into(), 10.0);
        state.resource_floors.insert("food".into(), 0.0);

        trade_resources(&mut state, "food", "gold", 50.0, 0);

        assert_eq!(*state.resources.get("food").unwrap(), 10.0);
        assert_eq!(state.violations.len(), 1);
    }

    #[test]
    fn refuses_to_trade_with_no_market_entity_alive() {
        let catalogue = catalogue_with_market();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.resources.insert("food".into(), 100.0);

        trade_resources(&mut state, "food", "gold", 50.0, 0);

        assert_eq!(*state.resources.get("food").unwrap(), 100.0);
        assert_eq!(state.violations[0].code, ViolationCode::InvalidAssignment);
    }

    #[test]
    fn refuses_an_unsupported_commodity() {
        let catalogue = catalogue_with_market();
        let mut state = SimState::new(&catalogue, -30.0, false);
        state.create_entity("market");
        state.resources.insert("food".into(), 100.0);

        trade_resources(&mut state, "food", "stone", 50.0, 0);

        assert_eq!(*state.resources.get("food").unwrap(), 100.0);
        assert_eq!(state.violations[0].code, ViolationCode::InvalidAssignment);
    }
}
