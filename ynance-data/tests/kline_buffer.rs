use ynance_data::{
    DashboardState, StreamUpdate, SubscriptionKey,
    exchange::binance::parse_message,
    indicator::IndicatorSet,
    model::KlineInterval,
    state::MAX_KLINE_BARS,
};

const MINUTE_MS: i64 = 60_000;
const START_MS: i64 = 1_700_000_000_000;

fn kline_frame(open_time_ms: i64, close: f64, closed: bool) -> String {
    format!(
        r#"{{"e":"kline","E":{event},"s":"BTCUSDT","k":{{"t":{open_time_ms},"T":{close_time},"s":"BTCUSDT","i":"1m","o":"{close}","c":"{close}","h":"{close}","l":"{close}","v":"1.5","n":10,"x":{closed}}}}}"#,
        event = open_time_ms + 1_000,
        close_time = open_time_ms + MINUTE_MS - 1,
    )
}

fn apply_frame(state: &mut DashboardState, key: &SubscriptionKey, frame: &str) {
    let update = parse_message(key, frame, 20)
        .expect("frame decodes")
        .expect("frame carries data");
    assert!(matches!(update, StreamUpdate::Kline { .. }));
    state.apply(update);
}

#[test]
fn kline_stream_appends_overwrites_and_caps_history() {
    let key = SubscriptionKey::kline("BTCUSDT", KlineInterval::Minute1);
    let mut state = DashboardState::new();

    // In-progress updates for the same minute overwrite the last row
    apply_frame(&mut state, &key, &kline_frame(START_MS, 100.0, false));
    apply_frame(&mut state, &key, &kline_frame(START_MS, 101.0, false));
    apply_frame(&mut state, &key, &kline_frame(START_MS, 102.0, true));

    let buffer = state.klines("BTCUSDT", KlineInterval::Minute1).unwrap();
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.last().unwrap().close, 102.0);

    // Each new minute appends a row
    for minute in 1..(MAX_KLINE_BARS as i64 + 50) {
        let open_time = START_MS + minute * MINUTE_MS;
        apply_frame(&mut state, &key, &kline_frame(open_time, 100.0 + minute as f64, true));
    }

    let buffer = state.klines("BTCUSDT", KlineInterval::Minute1).unwrap();
    assert_eq!(buffer.len(), MAX_KLINE_BARS);

    let open_times: Vec<i64> = buffer
        .bars()
        .map(|bar| bar.open_time.timestamp_millis())
        .collect();
    assert!(open_times.windows(2).all(|pair| pair[1] - pair[0] == MINUTE_MS));
    assert_eq!(
        *open_times.last().unwrap(),
        START_MS + (MAX_KLINE_BARS as i64 + 49) * MINUTE_MS
    );

    // A late frame for an evicted minute changes nothing
    apply_frame(&mut state, &key, &kline_frame(START_MS, 1.0, true));
    assert_eq!(
        state.klines("BTCUSDT", KlineInterval::Minute1).unwrap().len(),
        MAX_KLINE_BARS
    );

    // Indicators line up with the buffered history
    let closes = state
        .klines("BTCUSDT", KlineInterval::Minute1)
        .unwrap()
        .closes();
    let indicators = IndicatorSet::compute(&closes);
    assert_eq!(indicators.sma.len(), MAX_KLINE_BARS);
    let latest = indicators.latest();
    assert_eq!(latest.rsi, Some(100.0));
    assert!(latest.macd.unwrap() > 0.0);
}
