//! Single-position account state machine.
//!
//! The account is either fully deployed (Long) or fully idle (Flat). Buys
//! commit the whole cash balance; sells liquidate the whole position and split
//! any positive realized gain into tax, reserve and returned cash.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Position;

use super::state::CostModel;

/// Slack for float comparisons in invariant checks.
const BALANCE_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountError {
    #[error("invalid execution price {0}")]
    InvalidPrice(f64),

    #[error("account invariant violated: {0}")]
    InvariantViolated(String),
}

/// Result of a Flat → Long transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyFill {
    pub price: f64,
    pub units: f64,
    pub cost_basis: f64,
}

/// Result of a Long → Flat transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellFill {
    pub price: f64,
    pub gross_proceeds: f64,
    pub net_proceeds: f64,
    pub gross_gain: f64,
    pub tax: f64,
    pub reserve: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub position: Position,
    pub cash_balance: f64,
    pub units_held: f64,
    pub cost_basis: f64,
    pub reserve_accumulated: f64,
}

impl AccountState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            position: Position::Flat,
            cash_balance: initial_capital,
            units_held: 0.0,
            cost_basis: 0.0,
            reserve_accumulated: 0.0,
        }
    }

    /// Cash plus the open position valued at `price`, without fees.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.cash_balance + self.units_held * price
    }

    /// Mark-to-market value plus the reserve.
    pub fn equity(&self, price: f64) -> f64 {
        self.mark_to_market(price) + self.reserve_accumulated
    }

    /// Commit the full cash balance at `price`.
    ///
    /// Returns `Ok(None)` when already Long: the request is ignored.
    pub fn buy(&mut self, price: f64, costs: &CostModel) -> Result<Option<BuyFill>, AccountError> {
        check_price(price)?;
        if self.position.is_long() {
            return Ok(None);
        }
        if self.cash_balance <= 0.0 {
            return Err(AccountError::InvariantViolated(format!(
                "buy with non-positive cash balance {}",
                self.cash_balance
            )));
        }

        let cost_basis = self.cash_balance;
        let units = cost_basis * (1.0 - costs.transaction_fee_rate) / price;

        self.cost_basis = cost_basis;
        self.units_held = units;
        self.cash_balance = 0.0;
        self.position = Position::Long;
        self.check_invariants()?;

        Ok(Some(BuyFill {
            price,
            units,
            cost_basis,
        }))
    }

    /// Liquidate the full position at `price`.
    ///
    /// Returns `Ok(None)` when already Flat: the request is ignored.
    pub fn sell(
        &mut self,
        price: f64,
        costs: &CostModel,
    ) -> Result<Option<SellFill>, AccountError> {
        check_price(price)?;
        if self.position.is_flat() {
            return Ok(None);
        }

        let gross_proceeds = self.units_held * price;
        let net_proceeds = gross_proceeds * (1.0 - costs.transaction_fee_rate);
        let gross_gain = net_proceeds - self.cost_basis;
        let (tax, reserve) = if gross_gain > 0.0 {
            let tax = gross_gain * costs.tax_rate;
            (tax, (gross_gain - tax) * costs.reserve_rate)
        } else {
            (0.0, 0.0)
        };

        self.cash_balance = net_proceeds - tax - reserve;
        self.reserve_accumulated += reserve;
        self.units_held = 0.0;
        self.cost_basis = 0.0;
        self.position = Position::Flat;
        self.check_invariants()?;

        Ok(Some(SellFill {
            price,
            gross_proceeds,
            net_proceeds,
            gross_gain,
            tax,
            reserve,
        }))
    }

    /// Verify the position/balance consistency rules.
    pub fn check_invariants(&self) -> Result<(), AccountError> {
        let fields = [
            ("cash_balance", self.cash_balance),
            ("units_held", self.units_held),
            ("cost_basis", self.cost_basis),
            ("reserve_accumulated", self.reserve_accumulated),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(AccountError::InvariantViolated(format!(
                    "{name} is not finite ({value})"
                )));
            }
        }
        if self.reserve_accumulated < 0.0 {
            return Err(AccountError::InvariantViolated(format!(
                "negative reserve {}",
                self.reserve_accumulated
            )));
        }

        match self.position {
            Position::Flat => {
                if self.units_held != 0.0 {
                    return Err(AccountError::InvariantViolated(format!(
                        "flat account holds {} units",
                        self.units_held
                    )));
                }
                if self.cash_balance < -BALANCE_EPSILON {
                    return Err(AccountError::InvariantViolated(format!(
                        "flat account has negative cash {}",
                        self.cash_balance
                    )));
                }
            }
            Position::Long => {
                if self.units_held <= 0.0 {
                    return Err(AccountError::InvariantViolated(format!(
                        "long account holds {} units",
                        self.units_held
                    )));
                }
                if self.cash_balance != 0.0 {
                    return Err(AccountError::InvariantViolated(format!(
                        "long account has residual cash {}",
                        self.cash_balance
                    )));
                }
                if self.cost_basis <= 0.0 {
                    return Err(AccountError::InvariantViolated(format!(
                        "long account has cost basis {}",
                        self.cost_basis
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_price(price: f64) -> Result<(), AccountError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AccountError::InvalidPrice(price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn taxed() -> CostModel {
        CostModel {
            transaction_fee_rate: 0.0,
            tax_rate: 0.28,
            reserve_rate: 0.10,
        }
    }

    #[test]
    fn buy_commits_all_cash() {
        let mut account = AccountState::new(1000.0);
        let fill = account
            .buy(50.0, &CostModel::default())
            .unwrap()
            .expect("flat account buys");
        assert_eq!(fill.cost_basis, 1000.0);
        assert_approx(fill.units, 1000.0 * 0.999 / 50.0);
        assert_eq!(account.position, Position::Long);
        assert_eq!(account.cash_balance, 0.0);
        assert_eq!(account.cost_basis, 1000.0);
    }

    #[test]
    fn buy_while_long_is_ignored() {
        let mut account = AccountState::new(1000.0);
        account.buy(100.0, &taxed()).unwrap();
        let before = account.clone();
        assert_eq!(account.buy(90.0, &taxed()).unwrap(), None);
        assert_eq!(account, before);
    }

    #[test]
    fn sell_while_flat_is_ignored() {
        let mut account = AccountState::new(1000.0);
        assert_eq!(account.sell(100.0, &taxed()).unwrap(), None);
        assert_eq!(account, AccountState::new(1000.0));
    }

    #[test]
    fn profitable_sell_splits_tax_and_reserve() {
        let mut account = AccountState::new(1000.0);
        account.buy(100.0, &taxed()).unwrap();
        let fill = account.sell(110.0, &taxed()).unwrap().unwrap();

        assert_approx(fill.net_proceeds, 1100.0);
        assert_approx(fill.gross_gain, 100.0);
        assert_approx(fill.tax, 28.0);
        assert_approx(fill.reserve, 7.2);
        assert_approx(account.cash_balance, 1064.8);
        assert_approx(account.reserve_accumulated, 7.2);
        assert_eq!(account.position, Position::Flat);
        assert_eq!(account.units_held, 0.0);
    }

    #[test]
    fn losing_sell_pays_no_tax() {
        let mut account = AccountState::new(1000.0);
        account.buy(100.0, &taxed()).unwrap();
        let fill = account.sell(90.0, &taxed()).unwrap().unwrap();
        assert_eq!(fill.tax, 0.0);
        assert_eq!(fill.reserve, 0.0);
        assert_approx(account.cash_balance, 900.0);
        assert_eq!(account.reserve_accumulated, 0.0);
    }

    #[test]
    fn fees_apply_on_both_legs() {
        let costs = CostModel {
            transaction_fee_rate: 0.01,
            tax_rate: 0.0,
            reserve_rate: 0.0,
        };
        let mut account = AccountState::new(1000.0);
        account.buy(100.0, &costs).unwrap();
        account.sell(100.0, &costs).unwrap();
        assert_approx(account.cash_balance, 1000.0 * 0.99 * 0.99);
    }

    #[test]
    fn rejects_bad_prices() {
        let mut account = AccountState::new(1000.0);
        assert_eq!(
            account.buy(0.0, &taxed()),
            Err(AccountError::InvalidPrice(0.0))
        );
        assert!(account.buy(f64::NAN, &taxed()).is_err());
        assert_eq!(account, AccountState::new(1000.0));
    }

    #[test]
    fn detects_inconsistent_state() {
        let state = AccountState {
            position: Position::Long,
            cash_balance: 5.0,
            units_held: 1.0,
            cost_basis: 100.0,
            reserve_accumulated: 0.0,
        };
        assert!(matches!(
            state.check_invariants(),
            Err(AccountError::InvariantViolated(_))
        ));

        let state = AccountState {
            position: Position::Flat,
            units_held: 0.5,
            ..AccountState::new(100.0)
        };
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn equity_includes_reserve() {
        let mut account = AccountState::new(1000.0);
        account.buy(100.0, &taxed()).unwrap();
        account.sell(110.0, &taxed()).unwrap();
        assert_approx(account.equity(123.0), 1064.8 + 7.2);
    }
}
