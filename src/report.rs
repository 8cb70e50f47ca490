//! Text report of computed exposures, one block per market.

use crate::exposure::{ExposureResult, MarketId};
use crate::math::format_usd_float;
use std::fmt::Write;

/// Render one market block.
pub fn render_market(result: &ExposureResult) -> String {
    let symbol = result.market_id.as_str().to_uppercase();
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "------ {symbol} ------");
    let _ = writeln!(out, "Market Price: {}", result.usd_price);
    let _ = writeln!(out, "User collateral: {} USDC", result.collateral_usd);
    let _ = writeln!(out, "User maker position: {} {symbol}", result.maker_quantity);
    let _ = writeln!(out, "User maker leverage: {}x", result.leverage);
    let _ = writeln!(
        out,
        "User maker exposure: {} {}",
        result.maker_exposure, result.market_id
    );
    let _ = writeln!(
        out,
        "User maker exposure (USD): {}",
        format_usd_float(result.usd_maker_exposure)
    );

    out
}

/// Render every market, separated by blank lines.
pub fn render_report(results: &[ExposureResult]) -> String {
    results
        .iter()
        .map(render_market)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The line announcing which markets are being watched.
pub fn render_watch_banner<'a>(markets: impl IntoIterator<Item = &'a MarketId>) -> String {
    let names: Vec<&str> = markets.into_iter().map(MarketId::as_str).collect();
    let plural = if names.len() > 1 { "s" } else { "" };
    format!("Watching {} market{plural} for updates...", names.join(" , "))
}
