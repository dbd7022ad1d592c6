//! Live loop tests against a scripted quote source and temporary files.

use std::collections::VecDeque;
use std::fs;

use sweeplab_runner::{
    run_live, LiveConfig, LiveError, LiveLedger, LiveLog, LiveState, QuoteSource,
};

/// Replays a fixed list of quote results.
struct ScriptedSource {
    quotes: VecDeque<Result<f64, LiveError>>,
}

impl ScriptedSource {
    fn new(quotes: Vec<Result<f64, LiveError>>) -> Self {
        Self {
            quotes: quotes.into(),
        }
    }
}

impl QuoteSource for ScriptedSource {
    fn fetch_price(&mut self) -> Result<f64, LiveError> {
        self.quotes
            .pop_front()
            .unwrap_or_else(|| Err(LiveError::Network("script exhausted".into())))
    }
}

fn fast_config() -> LiveConfig {
    LiveConfig {
        poll_interval_secs: 0,
        history_limit: 5,
        ema_short: 2,
        ema_long: 3,
        rsi_period: 2,
        buy_rsi_ceiling: 101.0,
        ..LiveConfig::default()
    }
}

fn round_trip_quotes() -> Vec<Result<f64, LiveError>> {
    vec![
        Ok(10.0),
        Ok(20.0),
        Err(LiveError::Network("timeout".into())),
        Ok(30.0),
        Ok(40.0),
        Ok(35.0),
        Ok(45.0),
        Ok(36.0),
    ]
}

#[test]
fn quote_errors_are_logged_and_the_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = LiveLedger::new(dir.path().join("ledger.csv"));
    let log = LiveLog::new(dir.path().join("bot.log"));
    let config = fast_config();

    let mut source = ScriptedSource::new(round_trip_quotes());
    let mut state = LiveState::new();
    let summary = run_live(&mut source, &mut state, &config, &ledger, &log, Some(8)).unwrap();

    assert_eq!(summary.ticks, 8);
    assert_eq!(summary.quote_errors, 1);
    assert_eq!(summary.buys, 1);
    assert_eq!(summary.sells, 1);
    assert!((summary.net_profit - 0.62).abs() < 1e-9);
    assert!(!state.is_holding());

    let text = fs::read_to_string(log.path()).unwrap();
    assert!(text.lines().all(|l| l.starts_with('[') && l.contains("] ")));
    assert!(text.contains("Error: quote request failed: timeout"));
    assert!(text.contains("SIMULATED BUY at 35.00"));
    assert!(text.contains("SIMULATED SELL at 36.00"));
}

#[test]
fn ledger_keeps_historical_header_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = LiveLedger::new(dir.path().join("ledger.csv"));
    let log = LiveLog::new(dir.path().join("bot.log"));
    let config = fast_config();

    for _ in 0..2 {
        let mut source = ScriptedSource::new(round_trip_quotes());
        let mut state = LiveState::new();
        run_live(&mut source, &mut state, &config, &ledger, &log, Some(8)).unwrap();
    }

    let text = fs::read_to_string(ledger.path()).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Data/Hora,Tipo de operação,Preço de compra (€),Preço de venda (€),Lucro bruto (€),Lucro líquido (€)"
    );
    for row in &lines[1..] {
        assert!(row.ends_with(",venda,35.00,36.00,1.00,0.62"), "row: {row}");
    }
}

#[test]
fn write_failures_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the log file should be makes every log write fail.
    let log_path = dir.path().join("bot.log");
    fs::create_dir(&log_path).unwrap();
    let ledger = LiveLedger::new(dir.path().join("ledger.csv"));
    let log = LiveLog::new(log_path);

    let mut source = ScriptedSource::new(vec![Ok(10.0)]);
    let mut state = LiveState::new();
    let err = run_live(&mut source, &mut state, &fast_config(), &ledger, &log, Some(1)).unwrap_err();
    assert!(matches!(err, LiveError::Io { .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn zero_ticks_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = LiveLedger::new(dir.path().join("ledger.csv"));
    let log = LiveLog::new(dir.path().join("bot.log"));
    let mut source = ScriptedSource::new(vec![]);
    let mut state = LiveState::new();
    let summary = run_live(&mut source, &mut state, &fast_config(), &ledger, &log, Some(0)).unwrap();
    assert_eq!(summary.ticks, 0);
    assert!(!ledger.path().exists());
}
