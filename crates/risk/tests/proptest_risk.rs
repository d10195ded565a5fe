use common::TradeSide;
use proptest::prelude::*;
use risk::{BreakevenStatus, RiskConfig};

fn arb_side() -> impl Strategy<Value = TradeSide> {
    prop_oneof![Just(TradeSide::Buy), Just(TradeSide::Sell)]
}

proptest! {
    /// Stops always sit on the losing side of entry and targets on the winning side.
    #[test]
    fn targets_straddle_entry(
        entry in 0.0001f64..1_000_000.0f64,
        atr in 0.0001f64..10_000.0f64,
        side in arb_side(),
    ) {
        let risk = RiskConfig::default();
        let t = risk.targets(entry, atr, side);
        match side {
            TradeSide::Buy => {
                prop_assert!(t.stop_loss < entry);
                prop_assert!(t.take_profit > entry);
            }
            TradeSide::Sell => {
                prop_assert!(t.stop_loss > entry);
                prop_assert!(t.take_profit < entry);
            }
        }
    }

    /// Breakeven rules never panic and only ever return the entry or the
    /// original stop.
    #[test]
    fn breakeven_returns_entry_or_original_stop(
        entry in -10.0f64..1_000_000.0f64,
        current in -10.0f64..1_000_000.0f64,
        initial_sl in 0.0001f64..1_000_000.0f64,
    ) {
        let risk = RiskConfig::default();
        let update = risk.breakeven(entry, current, initial_sl);
        match update.status {
            BreakevenStatus::Activated => {
                prop_assert_eq!(update.stop_loss, entry);
            }
            BreakevenStatus::NotReached | BreakevenStatus::InvalidPrice => {
                prop_assert_eq!(update.stop_loss, initial_sl);
            }
        }
        if entry <= 0.0 || current <= 0.0 {
            prop_assert_eq!(update.status, BreakevenStatus::InvalidPrice);
        }
    }
}
