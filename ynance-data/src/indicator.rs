//! Technical indicators over an ordered close-price series.
//!
//! Every series function returns a vector the same length as its input. Entries inside the
//! warm-up window are `f64::NAN`.

use itertools::Itertools;

pub const SMA_PERIOD: usize = 20;
pub const EMA_SPAN: usize = 20;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Exponential Moving Average (EMA) calculator
///
/// Seeded with the simple average of the first `period` values, then smoothed with
/// `alpha = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    value: Option<f64>,
    count: usize,
    seed_sum: f64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
            count: 0,
            seed_sum: 0.0,
        }
    }

    /// Feed the next value, returning the EMA once the warm-up window is complete.
    pub fn update(&mut self, new_value: f64) -> Option<f64> {
        self.count += 1;

        self.value = match self.value {
            Some(current) => Some(self.alpha * new_value + (1.0 - self.alpha) * current),
            None => {
                self.seed_sum += new_value;
                (self.count == self.period).then(|| self.seed_sum / self.period as f64)
            }
        };

        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Simple moving average.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for (index, window) in values.windows(period).enumerate() {
        out[index + period - 1] = window.iter().sum::<f64>() / period as f64;
    }
    out
}

/// Exponential moving average over `span` periods.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Ema::new(span);
    values
        .iter()
        .map(|&value| ema.update(value).unwrap_or(f64::NAN))
        .collect()
}

/// Relative strength index using Wilder smoothing, scaled 0..=100.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let changes: Vec<f64> = values.iter().tuple_windows().map(|(a, b)| b - a).collect();

    let (mut avg_gain, mut avg_loss) = changes[..period]
        .iter()
        .fold((0.0, 0.0), |(gain, loss), &change| {
            (gain + change.max(0.0), loss + (-change).max(0.0))
        });
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    let smoothing = (period - 1) as f64;
    for (offset, &change) in changes[period..].iter().enumerate() {
        avg_gain = (avg_gain * smoothing + change.max(0.0)) / period as f64;
        avg_loss = (avg_loss * smoothing + (-change).max(0.0)) / period as f64;
        out[period + offset + 1] = rsi_value(avg_gain, avg_loss);
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD (12/26) with a 9-period signal line.
pub fn macd(values: &[f64]) -> Macd {
    let fast = ema(values, MACD_FAST);
    let slow = ema(values, MACD_SLOW);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

    // Signal smooths only the defined tail of the MACD line.
    let mut signal = vec![f64::NAN; line.len()];
    if let Some(start) = line.iter().position(|value| !value.is_nan()) {
        for (slot, value) in signal[start..].iter_mut().zip(ema(&line[start..], MACD_SIGNAL)) {
            *slot = value;
        }
    }

    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    Macd {
        line,
        signal,
        histogram,
    }
}

/// Standard indicator bundle rendered next to every price chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub sma: Vec<f64>,
    pub ema: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Macd,
}

/// Most recent value of each indicator, `None` while warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
}

impl IndicatorSet {
    pub fn compute(closes: &[f64]) -> Self {
        Self {
            sma: sma(closes, SMA_PERIOD),
            ema: ema(closes, EMA_SPAN),
            rsi: rsi(closes, RSI_PERIOD),
            macd: macd(closes),
        }
    }

    pub fn latest(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma: last_defined(&self.sma),
            ema: last_defined(&self.ema),
            rsi: last_defined(&self.rsi),
            macd: last_defined(&self.macd.line),
            macd_signal: last_defined(&self.macd.signal),
        }
    }
}

fn last_defined(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|value| !value.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_ema_seeded_with_simple_average() {
        let mut ema = Ema::new(3);

        assert_eq!(ema.update(100.0), None);
        assert_eq!(ema.update(102.0), None);
        assert!(!ema.is_ready());

        // Seed: (100 + 102 + 104) / 3 = 102
        assert_eq!(ema.update(104.0), Some(102.0));

        // alpha = 2 / (3 + 1) = 0.5 -> 0.5 * 106 + 0.5 * 102 = 104
        assert_eq!(ema.update(106.0), Some(104.0));
        assert!((ema.alpha() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sma_warm_up_and_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&values, 3);

        assert!(out[0].is_nan() && out[1].is_nan());
        assert_eq!(&out[2..], &[2.0, 3.0, 4.0]);
        assert!(sma(&values, 6).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ema_span_20_warm_up() {
        let out = ema(&wave(40), EMA_SPAN);
        assert!(out[..19].iter().all(|v| v.is_nan()));
        assert!(out[19..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_macd_is_fast_minus_slow_ema() {
        let closes = wave(60);
        let result = macd(&closes);
        let fast = ema(&closes, 12);
        let slow = ema(&closes, 26);

        assert_eq!(result.line.len(), closes.len());
        for index in 25..closes.len() {
            assert!((result.line[index] - (fast[index] - slow[index])).abs() < 1e-12);
        }
        assert!(result.line[..25].iter().all(|v| v.is_nan()));

        // Signal needs 9 defined MACD values: first defined at 25 + 8
        assert!(result.signal[32].is_nan());
        assert!(result.signal[33].is_finite());
        assert!((result.histogram[40] - (result.line[40] - result.signal[40])).abs() < 1e-12);
    }

    #[test]
    fn test_macd_short_series_is_undefined() {
        let result = macd(&wave(25));
        assert_eq!(result.line.len(), 25);
        assert!(result.line.iter().all(|v| v.is_nan()));
        assert!(result.signal.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rsi_bounds() {
        let out = rsi(&wave(80), RSI_PERIOD);

        assert!(out[..14].iter().all(|v| v.is_nan()));
        for value in &out[14..] {
            assert!((0.0..=100.0).contains(value), "RSI out of bounds: {value}");
        }
    }

    #[test]
    fn test_rsi_monotonic_series() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();

        assert_eq!(*rsi(&rising, RSI_PERIOD).last().unwrap(), 100.0);
        assert_eq!(*rsi(&falling, RSI_PERIOD).last().unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let out = rsi(&[10.0; 20], RSI_PERIOD);
        assert_eq!(out[19], 50.0);
    }

    #[test]
    fn test_indicator_set_latest() {
        let set = IndicatorSet::compute(&wave(10));
        let latest = set.latest();
        assert_eq!(latest.sma, None);
        assert_eq!(latest.macd, None);

        let set = IndicatorSet::compute(&wave(50));
        let latest = set.latest();
        assert!(latest.sma.is_some());
        assert!(latest.ema.is_some());
        assert!(latest.rsi.is_some());
        assert!(latest.macd.is_some());
        assert!(latest.macd_signal.is_some());
    }
}
