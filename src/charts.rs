// =============================================================================
// Chart specifications handed to the renderer
// =============================================================================
//
// The backend never draws anything. It emits three renderer-agnostic line
// chart descriptions per refresh cycle:
//
//   market-trends           Price + one MA overlay per configured window
//   portfolio-performance   portfolio value series
//   vwap                    cumulative VWAP
//
// Undefined indicator positions become `y: null` so the renderer draws a gap.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::IndicatorSet;
use crate::market_data::MarketSeries;
use crate::portfolio::PortfolioPoint;

/// A single (x, y) point of a line series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: NaiveDate,
    pub y: Option<f64>,
}

/// One named line on a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl LineSeries {
    fn from_aligned(name: impl Into<String>, dates: &[NaiveDate], values: &[Option<f64>]) -> Self {
        let points = dates
            .iter()
            .zip(values)
            .map(|(&x, &y)| ChartPoint { x, y })
            .collect();
        Self {
            name: name.into(),
            points,
        }
    }
}

/// A titled line chart with axis labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<LineSeries>,
}

/// The three charts produced by one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBundle {
    pub market_trends: ChartSpec,
    pub portfolio_performance: ChartSpec,
    pub vwap: ChartSpec,
}

impl ChartBundle {
    pub fn build(series: &MarketSeries, indicators: &IndicatorSet, portfolio: &[PortfolioPoint]) -> Self {
        Self {
            market_trends: market_trends_chart(series, indicators),
            portfolio_performance: portfolio_chart(portfolio),
            vwap: vwap_chart(series, indicators),
        }
    }
}

/// Price plus every moving-average overlay, in configured window order.
pub fn market_trends_chart(series: &MarketSeries, indicators: &IndicatorSet) -> ChartSpec {
    let dates = series.dates();
    let closes: Vec<Option<f64>> = series.closes().into_iter().map(Some).collect();

    let mut lines = vec![LineSeries::from_aligned("Price", &dates, &closes)];
    for ma in indicators.moving_averages() {
        lines.push(LineSeries::from_aligned(ma.key.to_string(), &dates, &ma.values));
    }

    ChartSpec {
        id: "market-trends",
        title: "Market Trends".to_string(),
        x_label: "Date".to_string(),
        y_label: "Price".to_string(),
        lines,
    }
}

pub fn portfolio_chart(portfolio: &[PortfolioPoint]) -> ChartSpec {
    let points = portfolio
        .iter()
        .map(|p| ChartPoint {
            x: p.date,
            y: Some(p.value),
        })
        .collect();

    ChartSpec {
        id: "portfolio-performance",
        title: "Portfolio Performance".to_string(),
        x_label: "Date".to_string(),
        y_label: "Value".to_string(),
        lines: vec![LineSeries {
            name: "Value".to_string(),
            points,
        }],
    }
}

pub fn vwap_chart(series: &MarketSeries, indicators: &IndicatorSet) -> ChartSpec {
    let dates = series.dates();
    let lines = indicators
        .vwap()
        .map(|values| vec![LineSeries::from_aligned("VWAP", &dates, values)])
        .unwrap_or_default();

    ChartSpec {
        id: "vwap",
        title: "Volume Weighted Average Price (VWAP)".to_string(),
        x_label: "Date".to_string(),
        y_label: "VWAP".to_string(),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorEngine;
    use crate::market_data::PriceRecord;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn fixture() -> (MarketSeries, IndicatorSet) {
        let series = MarketSeries::new(
            "AAPL",
            vec![
                PriceRecord::new(d(1), "AAPL", 10.0, 100.0),
                PriceRecord::new(d(2), "AAPL", 20.0, 100.0),
                PriceRecord::new(d(3), "AAPL", 30.0, 200.0),
            ],
        )
        .unwrap();
        let set = IndicatorEngine::new(&[2, 3]).unwrap().compute(&series).unwrap();
        (series, set)
    }

    #[test]
    fn market_trends_overlays_every_window() {
        let (series, set) = fixture();
        let chart = market_trends_chart(&series, &set);
        let names: Vec<&str> = chart.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Price", "MA_2", "MA_3"]);
        assert_eq!(chart.title, "Market Trends");
        assert_eq!(chart.lines[1].points[0], ChartPoint { x: d(1), y: None });
        assert_eq!(chart.lines[1].points[2].y, Some(25.0));
        assert_eq!(chart.lines[2].points[2].y, Some(20.0));
    }

    #[test]
    fn vwap_chart_has_single_series() {
        let (series, set) = fixture();
        let chart = vwap_chart(&series, &set);
        assert_eq!(chart.lines.len(), 1);
        let ys: Vec<Option<f64>> = chart.lines[0].points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![Some(10.0), Some(15.0), Some(20.0)]);
        assert_eq!(chart.y_label, "VWAP");
    }

    #[test]
    fn undefined_points_serialise_as_null() {
        let (series, set) = fixture();
        let chart = market_trends_chart(&series, &set);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["lines"][1]["points"][0]["y"], serde_json::Value::Null);
        assert_eq!(json["lines"][1]["points"][0]["x"], "2024-05-01");
    }

    #[test]
    fn portfolio_chart_maps_points() {
        let pts = vec![
            PortfolioPoint { date: d(1), value: 10_000.0 },
            PortfolioPoint { date: d(2), value: 10_004.5 },
        ];
        let chart = portfolio_chart(&pts);
        assert_eq!(chart.id, "portfolio-performance");
        assert_eq!(chart.lines[0].name, "Value");
        assert_eq!(chart.lines[0].points[1].y, Some(10_004.5));
    }
}
