use super::ReportKind;
use chrono::NaiveDate;
use smol_str::SmolStr;
use std::fmt::Write;

/// Fixed outline every report follows, in order.
pub const REPORT_SECTIONS: [&str; 5] = [
    "Market issues",
    "Key events",
    "Index summary",
    "Synthesis",
    "Strategy",
];

/// Reference point an [`IndexClose`] change is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    /// Close of the previous trading session.
    #[default]
    PreviousClose,
    /// Price 24 hours earlier, for markets that never close.
    DayAgo,
}

impl Baseline {
    pub fn label(&self) -> &'static str {
        match self {
            Baseline::PreviousClose => "vs previous close",
            Baseline::DayAgo => "vs 24h ago",
        }
    }
}

/// Latest close of one tracked index or instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexClose {
    pub name: SmolStr,
    pub close: f64,
    pub previous_close: Option<f64>,
    pub baseline: Baseline,
}

impl IndexClose {
    pub fn new(name: SmolStr, close: f64, previous_close: Option<f64>) -> Self {
        Self {
            name,
            close,
            previous_close,
            baseline: Baseline::default(),
        }
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    /// Percentage change versus the baseline price.
    pub fn change_pct(&self) -> Option<f64> {
        self.previous_close
            .filter(|previous| *previous != 0.0)
            .map(|previous| (self.close - previous) / previous * 100.0)
    }
}

impl<S: Into<SmolStr>> From<(S, f64, Option<f64>)> for IndexClose {
    fn from((name, close, previous_close): (S, f64, Option<f64>)) -> Self {
        Self::new(name.into(), close, previous_close)
    }
}

/// Build the generation prompt for a report.
pub fn build_prompt(kind: ReportKind, date: NaiveDate, closes: &[IndexClose]) -> String {
    let mut prompt = String::new();

    let horizon = match kind {
        ReportKind::Daily => "the trading day",
        ReportKind::Weekly => "the trading week",
    };
    let _ = writeln!(
        prompt,
        "Write a {} market report for {horizon} ending {}.",
        kind.as_str(),
        date.format("%Y-%m-%d")
    );

    prompt.push_str("\nLatest closes:\n");
    if closes.is_empty() {
        prompt.push_str("- no market data was available\n");
    }
    for close in closes {
        let _ = match close.change_pct() {
            Some(change) => writeln!(
                prompt,
                "- {}: {:.2} ({:+.2}% {})",
                close.name,
                close.close,
                change,
                close.baseline.label()
            ),
            None => writeln!(prompt, "- {}: {:.2}", close.name, close.close),
        };
    }

    prompt.push_str("\nUse exactly these sections as level-2 headings, in this order:\n");
    for (index, section) in REPORT_SECTIONS.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {section}", index + 1);
    }
    prompt.push_str("\nKeep each section to a short paragraph and do not invent exact figures.\n");

    prompt
}
