//! Exit-side position matching.

use tracing::warn;

use kite_bridge_core::{Broker, BrokerError, Position, Product};

/// Fetches net positions fresh and returns the open one held in `root`.
///
/// # Errors
/// Propagates the broker failure; positions are never cached.
pub async fn find_open_position(
    broker: &dyn Broker,
    root: &str,
    exchange: &str,
    product: Product,
) -> Result<Option<Position>, BrokerError> {
    let positions = broker.positions().await?;
    Ok(select_open_position(&positions, root, exchange, product))
}

/// First position on `exchange` with `product`, a trading symbol starting
/// with `root` and a non-zero quantity.
///
/// When several positions match, broker list order decides and the extra
/// candidates are logged.
#[must_use]
pub fn select_open_position(
    positions: &[Position],
    root: &str,
    exchange: &str,
    product: Product,
) -> Option<Position> {
    let mut matches = positions.iter().filter(|p| {
        p.exchange == exchange
            && p.product == product.as_str()
            && p.tradingsymbol.starts_with(root)
            && p.is_open()
    });

    let first = matches.next()?;
    let others: Vec<&str> = matches.map(|p| p.tradingsymbol.as_str()).collect();
    if !others.is_empty() {
        warn!(
            root,
            chosen = %first.tradingsymbol,
            ignored = ?others,
            "Several open positions match root, closing the first"
        );
    }
    Some(first.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(exchange: &str, product: &str, symbol: &str, qty: i64) -> Position {
        Position::new(exchange, product, symbol, qty)
    }

    #[test]
    fn matches_exchange_product_prefix_and_quantity() {
        let positions = vec![
            pos("NFO", "MIS", "FINNIFTY26O2721050CE", 0),
            pos("NSE", "MIS", "FINNIFTY", 10),
            pos("NFO", "NRML", "FINNIFTY26O2721100CE", 65),
            pos("NFO", "MIS", "NIFTY26O2725000CE", 75),
            pos("NFO", "MIS", "FINNIFTY26O2721100PE", -65),
        ];
        let found = select_open_position(&positions, "FINNIFTY", "NFO", Product::Mis).unwrap();
        assert_eq!(found.tradingsymbol, "FINNIFTY26O2721100PE");
        assert_eq!(found.quantity, -65);
    }

    #[test]
    fn first_match_wins() {
        let positions = vec![
            pos("NFO", "MIS", "NIFTY26O2725000CE", 75),
            pos("NFO", "MIS", "NIFTY26O2725050CE", 150),
        ];
        let found = select_open_position(&positions, "NIFTY", "NFO", Product::Mis).unwrap();
        assert_eq!(found.tradingsymbol, "NIFTY26O2725000CE");
    }

    #[test]
    fn flat_or_foreign_positions_do_not_match() {
        let positions = vec![
            pos("NFO", "MIS", "NIFTY26O2725000CE", 0),
            pos("NFO", "MIS", "FINNIFTY26O2721050CE", 65),
        ];
        assert!(select_open_position(&positions, "NIFTY", "NFO", Product::Mis).is_none());
        assert!(select_open_position(&[], "NIFTY", "NFO", Product::Mis).is_none());
    }
}
