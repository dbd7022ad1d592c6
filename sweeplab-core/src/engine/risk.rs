//! Take-profit / stop-loss override evaluated before the strategy's decision
//! is executed.

use crate::strategy::Decision;

use super::accounting::AccountState;
use super::state::{CostModel, RiskConfig};

/// Which threshold forced the exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTrigger {
    TakeProfit,
    StopLoss,
}

impl RiskTrigger {
    pub fn reason(self, rate: f64) -> String {
        let label = match self {
            RiskTrigger::TakeProfit => "Take Profit",
            RiskTrigger::StopLoss => "Stop Loss",
        };
        format!("{label} ({:.1}%)", rate * 100.0)
    }
}

/// Evaluate the risk thresholds for an open position at `price`.
///
/// The trigger value is fee-adjusted here and the sell itself applies the fee
/// again. Take profit is checked first and both boundaries are inclusive.
pub fn check_risk(
    account: &AccountState,
    price: f64,
    costs: &CostModel,
    risk: &RiskConfig,
) -> Option<(RiskTrigger, f64)> {
    if !account.position.is_long() {
        return None;
    }
    let current_value = account.units_held * price * (1.0 - costs.transaction_fee_rate);
    let gross_gain = current_value - account.cost_basis;

    if let Some(tp) = risk.take_profit_rate {
        if gross_gain >= account.cost_basis * tp {
            return Some((RiskTrigger::TakeProfit, tp));
        }
    }
    if let Some(sl) = risk.stop_loss_rate {
        if gross_gain <= -account.cost_basis * sl {
            return Some((RiskTrigger::StopLoss, sl));
        }
    }
    None
}

/// Reconcile the strategy's decision with the risk override.
///
/// A triggered threshold always yields a Sell carrying the risk reason.
pub fn apply_override(
    decision: Decision,
    account: &AccountState,
    price: f64,
    costs: &CostModel,
    risk: &RiskConfig,
) -> Decision {
    match check_risk(account, price, costs, risk) {
        Some((trigger, rate)) => Decision::sell(trigger.reason(rate)),
        None => decision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Action;

    fn long_at(price: f64) -> AccountState {
        let mut account = AccountState::new(1000.0);
        account.buy(price, &CostModel::frictionless()).unwrap();
        account
    }

    fn risk(tp: f64, sl: f64) -> RiskConfig {
        RiskConfig {
            take_profit_rate: Some(tp),
            stop_loss_rate: Some(sl),
        }
    }

    #[test]
    fn flat_account_never_triggers() {
        let account = AccountState::new(1000.0);
        assert_eq!(
            check_risk(&account, 1.0, &CostModel::frictionless(), &risk(0.05, 0.03)),
            None
        );
    }

    #[test]
    fn take_profit_boundary_is_inclusive() {
        let account = long_at(100.0);
        let hit = check_risk(&account, 150.0, &CostModel::frictionless(), &risk(0.5, 0.25));
        assert_eq!(hit, Some((RiskTrigger::TakeProfit, 0.5)));
        let miss = check_risk(&account, 149.99, &CostModel::frictionless(), &risk(0.5, 0.25));
        assert_eq!(miss, None);
    }

    #[test]
    fn stop_loss_boundary_is_inclusive() {
        let account = long_at(100.0);
        let hit = check_risk(&account, 75.0, &CostModel::frictionless(), &risk(0.5, 0.25));
        assert_eq!(hit, Some((RiskTrigger::StopLoss, 0.25)));
        let miss = check_risk(&account, 75.01, &CostModel::frictionless(), &risk(0.5, 0.25));
        assert_eq!(miss, None);
    }

    #[test]
    fn disabled_thresholds_never_fire() {
        let account = long_at(100.0);
        let costs = CostModel::frictionless();
        assert_eq!(check_risk(&account, 1000.0, &costs, &RiskConfig::disabled()), None);
        assert_eq!(check_risk(&account, 1.0, &costs, &RiskConfig::disabled()), None);
    }

    #[test]
    fn fee_counts_against_the_trigger() {
        let account = long_at(100.0);
        let costs = CostModel {
            transaction_fee_rate: 0.01,
            ..CostModel::frictionless()
        };
        // 1.05 * 0.99 < 1.05, so 5% move is not enough with a fee.
        assert_eq!(check_risk(&account, 105.0, &costs, &risk(0.05, 0.5)), None);
    }

    #[test]
    fn override_replaces_hold_and_buy() {
        let account = long_at(100.0);
        let costs = CostModel::frictionless();
        for decision in [Decision::hold(), Decision::buy("RSI < 30")] {
            let out = apply_override(decision, &account, 110.0, &costs, &risk(0.05, 0.03));
            assert_eq!(out.action, Action::Sell);
            assert_eq!(out.reason, "Take Profit (5.0%)");
        }
    }

    #[test]
    fn override_supplies_reason_for_strategy_sell() {
        let account = long_at(100.0);
        let out = apply_override(
            Decision::sell("RSI > 70"),
            &account,
            90.0,
            &CostModel::frictionless(),
            &risk(0.05, 0.03),
        );
        assert_eq!(out.action, Action::Sell);
        assert_eq!(out.reason, "Stop Loss (3.0%)");
    }

    #[test]
    fn untriggered_override_passes_decision_through() {
        let account = long_at(100.0);
        let out = apply_override(
            Decision::sell("RSI > 70"),
            &account,
            101.0,
            &CostModel::frictionless(),
            &risk(0.05, 0.03),
        );
        assert_eq!(out.reason, "RSI > 70");
    }
}
