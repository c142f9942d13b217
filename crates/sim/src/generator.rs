//! Random workload generator.
//!
//! Per tick, `1..=max` actions are drawn uniformly from a 12-way
//! enumeration in which quote refreshes take six slots, amends three, and
//! insert/delete-order/delete-quote one each — a quote-heavy mix typical
//! of a market-making client. Generated prices live on the engine's tick
//! grid; quotes are internally non-crossing by construction (`bid < ask`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mmc_core::types::{OrderId, Price, Qty, Side};
use mmc_oms::order::{OrderState, QuoteSide};
use mmc_oms::{Engine, OmsError};

/// Workload actions; the draw collapses the weighted 12-way enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InsertOrder,
    Quote,
    AmendOrder,
    DeleteOrder,
    DeleteQuote,
}

/// Seeded generator of order-management actions.
pub struct ActionGenerator {
    rng: StdRng,
    upper_price: i64,
    max_actions_per_tick: u32,
}

impl ActionGenerator {
    pub fn new(seed: u64, upper_price: i64, max_actions_per_tick: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            upper_price,
            max_actions_per_tick,
        }
    }

    /// Generate and apply this tick's batch of actions.
    pub fn run_tick(&mut self, engine: &mut Engine) -> Result<(), OmsError> {
        let actions = self.rng.gen_range(1..=self.max_actions_per_tick);
        for _ in 0..actions {
            let action = self.draw_action();
            self.perform(engine, action)?;
        }
        Ok(())
    }

    /// Uniform draw over the 12-way enumeration.
    fn draw_action(&mut self) -> Action {
        match self.rng.gen_range(0..12u32) {
            0 => Action::InsertOrder,
            1..=6 => Action::Quote,
            7..=9 => Action::AmendOrder,
            10 => Action::DeleteOrder,
            _ => Action::DeleteQuote,
        }
    }

    fn perform(&mut self, engine: &mut Engine, action: Action) -> Result<(), OmsError> {
        match action {
            Action::InsertOrder => {
                let side = self.random_side();
                let price = self.random_price(1, self.upper_price);
                let qty = self.random_qty();
                engine.insert_order(side, price, qty)?;
            }
            Action::Quote => {
                // Draw order matters for reproducibility: bid price, bid
                // qty, ask price, ask qty.
                let bid_price = self.random_price(1, self.upper_price - 1);
                let bid_qty = self.random_qty();
                let ask_price = self.random_price(bid_price.value() + 1, self.upper_price);
                let ask_qty = self.random_qty();
                engine.insert_quote(
                    QuoteSide {
                        price: bid_price,
                        qty: bid_qty,
                    },
                    QuoteSide {
                        price: ask_price,
                        qty: ask_qty,
                    },
                )?;
            }
            Action::AmendOrder => {
                if let Some(order_id) = self.pick_live_order(engine) {
                    let price = self.random_price(1, self.upper_price);
                    let qty = self.random_qty();
                    engine.amend_order(order_id, price, qty)?;
                }
            }
            Action::DeleteOrder => {
                if let Some(order_id) = self.pick_live_order(engine) {
                    engine.delete_order(order_id)?;
                }
            }
            Action::DeleteQuote => {
                engine.delete_quote()?;
            }
        }
        Ok(())
    }

    /// Pick a uniformly random live, non-quote order — one that is neither
    /// deleting nor gone. Returns `None` when there is nothing to pick.
    fn pick_live_order(&mut self, engine: &Engine) -> Option<OrderId> {
        let candidates: Vec<OrderId> = engine
            .store()
            .orders()
            .filter(|o| {
                !o.is_quote
                    && matches!(
                        o.state,
                        OrderState::PriorToMarket | OrderState::OnMarket
                    )
            })
            .map(|o| o.id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }

    fn random_price(&mut self, lower: i64, upper: i64) -> Price {
        Price(self.rng.gen_range(lower..=upper))
    }

    fn random_qty(&mut self) -> Qty {
        Qty(self.rng.gen_range(1..=100))
    }

    fn random_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
