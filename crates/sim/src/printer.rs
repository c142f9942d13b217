//! Terminal price-ladder printer.
//!
//! Renders the shadow book as a ladder from the top of the grid down to 1:
//! aggregated bid quantity right-aligned, the price level, aggregated ask
//! quantity left-aligned. A level carrying both sides is flagged inline —
//! the printed ladder is the human-readable face of the same oracle the
//! engine asserts silently after every dispatch.

use std::fmt::Write as _;

use mmc_oms::book::Ladder;

/// Marker line emitted under a crossed level.
pub const CROSS_MARKER: &str = "********* IN CROSS ************";

/// Render the ladder to a string. Returns the rendering and whether any
/// level was crossed.
pub fn render_ladder(ladder: &Ladder) -> (String, bool) {
    let mut out = String::new();
    let mut crossed = false;
    for (price, bid, ask) in ladder.levels() {
        let bid_cell = if bid.is_zero() {
            format!("{:>5}", "")
        } else {
            format!("{:>5}", bid.value())
        };
        let ask_cell = if ask.is_zero() {
            format!("{:<5}", "")
        } else {
            format!("{:<5}", ask.value())
        };
        writeln!(out, "{} {} {}", bid_cell, price, ask_cell).expect("write to string");
        if !bid.is_zero() && !ask.is_zero() {
            writeln!(out, "{}", CROSS_MARKER).expect("write to string");
            crossed = true;
        }
    }
    (out, crossed)
}

/// Print the ladder to stdout. Returns `true` if any level was crossed.
pub fn print_ladder(ladder: &Ladder) -> bool {
    let (rendered, crossed) = render_ladder(ladder);
    print!("{rendered}");
    crossed
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmc_core::config::EngineConfig;
    use mmc_core::types::{Price, Qty, Side};
    use mmc_oms::oracle::ScriptedOracle;
    use mmc_oms::Engine;

    fn engine() -> Engine {
        let config = EngineConfig {
            upper_price: 9,
            throttle_closed_probability: 0.15,
            max_drain_per_tick: 10,
            max_acks_per_tick: 10,
            order_gc_threshold: 1000,
            quote_history_limit: 200,
            quote_history_truncate: 150,
        };
        Engine::new(config, Box::new(ScriptedOracle::always_open()))
    }

    #[test]
    fn test_empty_ladder_renders_all_levels() {
        let eng = engine();
        let (rendered, crossed) = render_ladder(&eng.ladder());
        assert!(!crossed);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains(" 9 "));
        assert!(lines[8].contains(" 1 "));
    }

    #[test]
    fn test_resting_orders_rendered_aligned() {
        let mut eng = engine();
        eng.insert_order(Side::Buy, Price(4), Qty(10)).unwrap();
        eng.insert_order(Side::Sell, Price(6), Qty(7)).unwrap();

        let (rendered, crossed) = render_ladder(&eng.ladder());
        assert!(!crossed);
        let lines: Vec<&str> = rendered.lines().collect();
        // Levels run 9 down to 1: level 6 is line index 3, level 4 index 5.
        assert_eq!(lines[3], "      6 7    ");
        assert_eq!(lines[5], "   10 4      ");
    }

    #[test]
    fn test_crossed_level_flagged() {
        // The guard never lets the engine reach this state; drive the book
        // types directly to exercise the rendering.
        use mmc_oms::book::ShadowBook;
        use mmc_oms::order::{OperationPayload, OperationType};
        use mmc_oms::store::EntityStore;

        let mut store = EntityStore::new();
        let mut book = ShadowBook::new();
        for side in [Side::Buy, Side::Sell] {
            let order_id = store.alloc_order(side, Price(5), Qty(10));
            let op = store.alloc_operation(
                order_id,
                OperationType::InsertOrder,
                None,
                OperationPayload::Order {
                    price: Price(5),
                    qty: Qty(10),
                },
            );
            book.push(op);
        }

        let (rendered, crossed) = render_ladder(&book.ladder(&store, 9));
        assert!(crossed);
        assert!(rendered.contains(CROSS_MARKER));
    }
}
