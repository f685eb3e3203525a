//! One row per (symbol, strategy) opportunity, best score first.

use crate::scanner::OpportunityBundle;

use super::ReportError;

const HEADER: [&str; 9] = [
    "symbol",
    "strategy",
    "score",
    "current_price",
    "direction",
    "leverage",
    "stop_loss",
    "take_profit",
    "direction_score",
];

struct Row<'a> {
    symbol: &'a str,
    strategy: &'static str,
    score: f64,
    price: f64,
    direction: &'static str,
    leverage: u32,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    direction_score: Option<f64>,
}

pub fn render_csv(opportunities: &[OpportunityBundle]) -> Result<String, ReportError> {
    let mut rows = Vec::new();
    for opp in opportunities {
        if let Some(spot) = &opp.spot {
            rows.push(Row {
                symbol: &opp.symbol,
                strategy: "spot",
                score: spot.score,
                price: spot.current_price,
                direction: "long",
                leverage: 1,
                stop_loss: Some(spot.stop_loss),
                take_profit: Some(spot.take_profit),
                direction_score: None,
            });
        }
        if let Some(fut) = &opp.futures {
            rows.push(Row {
                symbol: &opp.symbol,
                strategy: "futures",
                score: fut.score,
                price: fut.current_price,
                direction: fut.position_type.as_str(),
                leverage: fut.leverage,
                stop_loss: Some(fut.stop_loss),
                take_profit: Some(fut.take_profit),
                direction_score: Some(fut.direction_score),
            });
        }
        if let Some(grid) = &opp.grid {
            rows.push(Row {
                symbol: &opp.symbol,
                strategy: "grid",
                score: grid.score,
                price: grid.current_price,
                direction: grid.grid_type.as_str(),
                leverage: grid.leverage,
                stop_loss: None,
                take_profit: None,
                direction_score: Some(grid.direction_score),
            });
        }
    }
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADER)?;
    for r in &rows {
        wtr.write_record([
            r.symbol.to_string(),
            r.strategy.to_string(),
            format!("{:.4}", r.score),
            format!("{:.8}", r.price),
            r.direction.to_string(),
            r.leverage.to_string(),
            opt(r.stop_loss, 8),
            opt(r.take_profit, 8),
            opt(r.direction_score, 4),
        ])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| ReportError::Csv(e.into_error().into()))?;
    String::from_utf8(data).map_err(|_| ReportError::Utf8)
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_default()
}
