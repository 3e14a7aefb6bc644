//! Warehouse schema.

/// Tables and indexes of the warehouse. Every statement is idempotent.
pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS securities (
    security_id INTEGER PRIMARY KEY,
    ticker TEXT NOT NULL,
    sector TEXT
);

CREATE TABLE IF NOT EXISTS prices (
    security_id INTEGER NOT NULL,
    trade_date TEXT NOT NULL,
    adj_close REAL,
    close REAL,
    open REAL,
    high REAL,
    low REAL,
    PRIMARY KEY (security_id, trade_date)
);
CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(trade_date);

CREATE TABLE IF NOT EXISTS fundamentals (
    security_id INTEGER NOT NULL,
    period_end TEXT NOT NULL,
    metric TEXT NOT NULL,
    value REAL NOT NULL,
    PRIMARY KEY (security_id, period_end, metric)
);
CREATE INDEX IF NOT EXISTS idx_fundamentals_metric ON fundamentals(metric);

CREATE TABLE IF NOT EXISTS factor_definitions (
    factor_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    params_json TEXT NOT NULL,
    description TEXT NOT NULL,
    version INTEGER NOT NULL,
    expression TEXT NOT NULL,
    source TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    tags TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS factor_values (
    security_id INTEGER NOT NULL,
    trade_date TEXT NOT NULL,
    factor_id INTEGER NOT NULL REFERENCES factor_definitions(factor_id),
    raw_value REAL NOT NULL,
    market_zscore REAL,
    market_rank_pct REAL,
    sector_zscore REAL,
    sector_rank_pct REAL,
    calc_run_id TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (security_id, trade_date, factor_id)
);
CREATE INDEX IF NOT EXISTS idx_factor_values_factor_date ON factor_values(factor_id, trade_date);
";
