// =============================================================================
// Alpha Vantage response parsing
// =============================================================================
//
// Payload shape for TIME_SERIES_DAILY_ADJUSTED:
//
//   {
//     "Meta Data": { ... },
//     "Time Series (Daily)": {
//       "2024-03-01": {
//         "1. open": "179.5500", "2. high": "180.5300", "3. low": "177.3800",
//         "4. close": "179.6600", "5. adjusted close": "179.4187",
//         "6. volume": "73563082", "7. dividend amount": "0.0000",
//         "8. split coefficient": "1.0"
//       },
//       ...
//     }
//   }
//
// Error payloads carry none of that and instead one of "Error Message"
// (invalid symbol / bad function), "Note" or "Information" (rate limit, key
// problems). Numeric fields are strings.
// =============================================================================

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::PipelineError;
use crate::market_data::{MarketSeries, PriceRecord};
use crate::types::Granularity;

/// Close labels in order of preference.
const CLOSE_FIELDS: [&str; 2] = ["5. adjusted close", "4. close"];

/// Volume labels: the adjusted endpoint uses "6. volume", the plain daily
/// endpoint "5. volume".
const VOLUME_FIELDS: [&str; 2] = ["6. volume", "5. volume"];

/// Top-level keys the provider uses to report a problem instead of data.
const NOTICE_FIELDS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Normalise a provider payload into a [`MarketSeries`].
///
/// Any malformed record rejects the whole payload so callers never see a
/// partial series.
pub fn parse_daily_series(
    symbol: &str,
    granularity: Granularity,
    body: &Value,
) -> Result<MarketSeries, PipelineError> {
    let key = granularity.series_key();

    let Some(entries) = body.get(key).and_then(Value::as_object) else {
        return Err(PipelineError::data_unavailable(symbol, missing_series_reason(key, body)));
    };

    let mut records = Vec::with_capacity(entries.len());

    for (date_str, fields) in entries {
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            PipelineError::data_unavailable(symbol, format!("invalid date '{date_str}': {e}"))
        })?;

        let close_price = first_number(symbol, fields, &CLOSE_FIELDS)?.ok_or_else(|| {
            PipelineError::data_unavailable(symbol, format!("no close price for {date}"))
        })?;
        if !close_price.is_finite() || close_price <= 0.0 {
            return Err(PipelineError::data_unavailable(
                symbol,
                format!("non-positive close {close_price} for {date}"),
            ));
        }

        let volume = first_number(symbol, fields, &VOLUME_FIELDS)?.ok_or_else(|| {
            PipelineError::data_unavailable(symbol, format!("no volume for {date}"))
        })?;
        if !volume.is_finite() || volume < 0.0 {
            return Err(PipelineError::data_unavailable(
                symbol,
                format!("invalid volume {volume} for {date}"),
            ));
        }

        records.push(PriceRecord::new(date, symbol, close_price, volume));
    }

    MarketSeries::new(symbol, records)
}

/// Explain why the series key is absent, preferring the provider's own text.
fn missing_series_reason(key: &str, body: &Value) -> String {
    for notice in NOTICE_FIELDS {
        if let Some(text) = body.get(notice).and_then(Value::as_str) {
            return format!("{notice}: {text}");
        }
    }
    format!("response has no '{key}' section")
}

/// Parse the first label present in `fields`.
///
/// `Ok(None)` when none of the labels exist; an error when a label exists but
/// does not hold a number.
fn first_number(symbol: &str, fields: &Value, labels: &[&str]) -> Result<Option<f64>, PipelineError> {
    let Some((label, raw)) = labels
        .iter()
        .find_map(|label| fields.get(*label).map(|v| (*label, v)))
    else {
        return Ok(None);
    };

    parse_str_f64(raw).map(Some).ok_or_else(|| {
        PipelineError::data_unavailable(symbol, format!("field '{label}' is not numeric: {raw}"))
    })
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_str_f64(val: &Value) -> Option<f64> {
    match val {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
