//! Plain-text summary of the best opportunities.

use chrono::{DateTime, Local};
use shibamoon_core::strategy::score::ScoreComponents;

use crate::scanner::OpportunityBundle;

const SIGNAL_NAMES: [&str; 4] = [
    "trend_score",
    "momentum_score",
    "volatility_score",
    "volume_score",
];

/// Render the top `top_n` symbols by best strategy score. Strategies scoring
/// below `threshold` are left out of a symbol's entry.
pub fn render_summary(
    opportunities: &[OpportunityBundle],
    top_n: usize,
    threshold: f64,
    generated_at: DateTime<Local>,
) -> String {
    let mut ranked: Vec<&OpportunityBundle> = opportunities.iter().collect();
    ranked.sort_by(|a, b| b.best_score().total_cmp(&a.best_score()));

    let mut lines = vec![format!(
        "=== Top {top_n} Crypto Investment Opportunities ===\n"
    )];

    for opp in ranked.into_iter().take(top_n) {
        lines.push(format!("\nSymbol: {}", opp.symbol));

        if let Some(spot) = opp.spot.as_ref().filter(|s| s.score >= threshold) {
            lines.push("\n1. Spot Trading Opportunity:".into());
            lines.push(format!("Price: ${:.4}", spot.current_price));
            lines.push(format!("Score: {:.2}", spot.score));
            push_signals(&mut lines, &spot.signals);
        }

        if let Some(fut) = opp.futures.as_ref().filter(|f| f.score >= threshold) {
            lines.push("\n2. Futures Trading Opportunity:".into());
            lines.push(format!("Price: ${:.4}", fut.current_price));
            lines.push(format!("Position: {}", fut.position_type.as_str().to_uppercase()));
            lines.push(format!("Score: {:.2}", fut.score));
            lines.push(format!("Direction Score: {:.2}", fut.direction_score));
            lines.push(format!("Suggested Leverage: {}x", fut.leverage));
            lines.push(format!("Stop Loss: ${:.4}", fut.stop_loss));
            lines.push(format!("Take Profit: ${:.4}", fut.take_profit));
            push_signals(&mut lines, &fut.signals);
        }

        if let Some(grid) = opp.grid.as_ref().filter(|g| g.score >= threshold) {
            let p = &grid.grid_parameters;
            lines.push("\n3. Grid Trading Opportunity:".into());
            lines.push(format!("Price: ${:.4}", grid.current_price));
            lines.push(format!("Score: {:.2}", grid.score));
            lines.push(format!("Grid Type: {}", grid.grid_type.as_str().to_uppercase()));
            lines.push(format!("Direction Score: {:.2}", grid.direction_score));
            lines.push(format!("Volatility: {:.2}%", grid.volatility));
            lines.push(format!("Suggested Leverage: {}x", grid.leverage));
            lines.push("\nGrid Parameters:".into());
            lines.push(format!("  - Upper Price: ${:.4}", p.upper_price));
            lines.push(format!("  - Lower Price: ${:.4}", p.lower_price));
            lines.push(format!("  - Grid Number: {}", p.grid_number));
            lines.push(format!("  - Grid Spacing: ${:.4}", p.grid_spacing));
            lines.push(format!("  - Investment per Grid: ${:.2}", p.investment_per_grid));
            lines.push(format!("  - Price Precision: {}", p.price_precision));
            lines.push(format!("  - Quantity Precision: {}", p.quantity_precision));
        }

        lines.push(format!("\n{}", "=".repeat(50)));
    }

    lines.push(format!(
        "\nGenerated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.join("\n")
}

/// A signal is marked active when its sub-score is non-zero.
fn push_signals(lines: &mut Vec<String>, signals: &ScoreComponents) {
    lines.push("Signals:".into());
    for (name, value) in SIGNAL_NAMES.iter().zip(signals.values()) {
        let mark = if value != 0.0 { '✓' } else { '✗' };
        lines.push(format!("  - {name}: {mark}"));
    }
}
