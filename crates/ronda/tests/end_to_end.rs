//! History in the warehouse through to rebalanced target weights.

use approx::assert_relative_eq;
use ronda::prelude::*;
use ronda::factors::{FactorOptions, build_factors};
use ronda::store::{Database, PriceBar, SecurityRecord, StoreConfig};
use ronda::traits::FundamentalRecord;

const SECURITIES: [(i64, &str, &str); 4] = [
    (1, "AAA", "Tech"),
    (2, "BBB", "Tech"),
    (3, "CCC", "Energy"),
    (4, "DDD", "Energy"),
];

fn trading_days() -> Vec<Date> {
    let mut day = Date::from_ymd_opt(2024, 1, 2).unwrap();
    let mut days = Vec::new();
    while days.len() < 45 {
        if chrono::Datelike::weekday(&day).number_from_monday() <= 5 {
            days.push(day);
        }
        day = day.succ_opt().unwrap();
    }
    days
}

fn seed(db: &Database) -> Vec<Date> {
    let history = db.history();
    let days = trading_days();

    history
        .insert_securities(
            &SECURITIES
                .iter()
                .map(|(id, ticker, sector)| SecurityRecord {
                    security_id: *id,
                    ticker: (*ticker).to_string(),
                    sector: Some((*sector).to_string()),
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();

    let mut bars = Vec::new();
    for (id, _, _) in SECURITIES {
        let drift = 0.002 * (id as f64 - 2.5);
        for (t, day) in days.iter().enumerate() {
            let price = 50.0 * (1.0 + drift).powi(t as i32);
            bars.push(PriceBar {
                adj_close: Some(price),
                close: Some(price),
                ..PriceBar::empty(id, *day)
            });
        }
    }
    history.insert_prices(&bars).unwrap();

    let mut fundamentals = Vec::new();
    for (id, _, _) in SECURITIES {
        fundamentals.push(FundamentalRecord {
            security_id: id,
            period_end: Date::from_ymd_opt(2023, 12, 31).unwrap(),
            metric: "eps".to_string(),
            value: id as f64,
        });
    }
    history.insert_fundamentals(&fundamentals).unwrap();
    days
}

#[test]
fn warehouse_to_weights() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&StoreConfig::at(dir.path().join("ronda.db"))).unwrap();
    db.initialize_schema().unwrap();
    let days = seed(&db);

    let history = db.history();
    let store = db.factor_store();
    let pipeline = FactorPipeline::new(&history, &history, NormalizeConfig::default())
        .unwrap()
        .with_store(&store);

    let factors = build_factors(
        &["momentum_5p_skip_1p", "earnings_yield"],
        &FactorOptions::default(),
    )
    .unwrap();
    let run_id = CalcRunId::new("e2e").unwrap();
    let runs = pipeline.run(&factors, &run_id).unwrap();
    assert_eq!(runs.len(), 2);

    // Momentum needs six prior periods; earnings yield is defined every day.
    assert_eq!(runs[0].values.len(), (days.len() - 6) * SECURITIES.len());
    assert_eq!(runs[1].values.len(), days.len() * SECURITIES.len());
    assert!(runs[0].values.iter().all(|v| v.sector_zscore.is_some()));

    // Re-running overwrites in place.
    let rerun = pipeline.run(&factors, &run_id).unwrap();
    assert_eq!(rerun[0].summary.unwrap().inserted, 0);
    assert_eq!(rerun[0].factor_id, runs[0].factor_id);
    assert_eq!(store.list_definitions(true).unwrap().len(), 2);

    let panel = load_score_panel(
        &store,
        "momentum_5p_skip_1p",
        ScoreColumn::MarketZscore,
        &DateRange::all(),
    )
    .unwrap();

    let builder = WeightBuilder::new(WeightConfig {
        frequency: RebalanceFrequency::Monthly,
        ..WeightConfig::with_strategy(Strategy::LongShort {
            size: SelectionSize::Count(1),
        })
    })
    .unwrap();
    let prices = history
        .prices(PriceColumn::AdjClose, &DateRange::all())
        .unwrap();
    let input = builder.build_simulation(&panel, &prices).unwrap();
    let weights = &input.weights;
    assert_eq!(weights.dates().len(), days.len());

    // The fastest riser is long and the fastest faller short after the
    // January rebalance.
    let jan_31 = Date::from_ymd_opt(2024, 1, 31).unwrap();
    assert_relative_eq!(weights.weight(jan_31, 4).unwrap(), 0.5);
    assert_relative_eq!(weights.weight(jan_31, 1).unwrap(), -0.5);
    assert_relative_eq!(weights.weight(days[0], 4).unwrap(), 0.0);

    let longs = weights.long_exposure();
    let shorts = weights.short_exposure();
    for (i, day) in weights.dates().iter().enumerate() {
        if *day >= jan_31 {
            assert_relative_eq!(longs[i], 0.5);
            assert_relative_eq!(shorts[i], -0.5);
        }
    }

    let out = dir.path().join("weights.csv");
    weights.write_csv(&out).unwrap();
    assert!(std::fs::read_to_string(out).unwrap().starts_with("trade_date,1,2,3,4"));
}
