use super::{C_ACCENT, C_BRIGHT, C_DIM, C_DOWN, C_NEUTRAL, C_UP, fmt_opt, fmt_price, panel};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
};
use ynance_data::indicator::{
    EMA_SPAN, IndicatorSet, IndicatorSnapshot, RSI_PERIOD, SMA_PERIOD,
};

/// `(index, value)` points for a chart, skipping warm-up NaNs.
fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(index, value)| (index as f64, *value))
        .collect()
}

/// Y bounds with a small margin so the line never touches the border.
pub(crate) fn y_bounds(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let (low, high) = series
        .iter()
        .flat_map(|points| points.iter().map(|(_, y)| *y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), y| {
            (low.min(y), high.max(y))
        });

    if !low.is_finite() || !high.is_finite() {
        return [0.0, 1.0];
    }
    let margin = ((high - low) * 0.05).max(high.abs() * 0.001).max(f64::EPSILON);
    [low - margin, high + margin]
}

/// Line chart of closes with SMA and EMA overlays.
pub(crate) fn render_price_chart(
    f: &mut Frame,
    area: Rect,
    title: &str,
    x_labels: [String; 2],
    closes: &[f64],
    indicators: &IndicatorSet,
) {
    let close = points(closes);
    let sma = points(&indicators.sma);
    let ema = points(&indicators.ema);
    let [low, high] = y_bounds(&[close.as_slice(), sma.as_slice(), ema.as_slice()]);
    let sma_name = format!("SMA{SMA_PERIOD}");
    let ema_name = format!("EMA{EMA_SPAN}");

    let datasets = vec![
        Dataset::default()
            .name("close")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_BRIGHT))
            .data(&close),
        Dataset::default()
            .name(sma_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_NEUTRAL))
            .data(&sma),
        Dataset::default()
            .name(ema_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_ACCENT))
            .data(&ema),
    ];

    let [first, last] = x_labels;
    let chart = Chart::new(datasets)
        .block(panel(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, closes.len().saturating_sub(1).max(1) as f64])
                .labels([Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([low, high])
                .labels([Span::raw(fmt_price(low)), Span::raw(fmt_price(high))]),
        );
    f.render_widget(chart, area);
}

fn rsi_color(rsi: f64) -> ratatui::style::Color {
    if rsi >= 70.0 {
        C_DOWN
    } else if rsi <= 30.0 {
        C_UP
    } else {
        C_BRIGHT
    }
}

/// Latest indicator values, one per line.
pub(crate) fn render_indicator_panel(f: &mut Frame, area: Rect, snapshot: &IndicatorSnapshot) {
    let label = |text: String| Span::styled(text, Style::default().fg(C_DIM));
    let value = |text: String| {
        Span::styled(text, Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD))
    };

    let rsi = match snapshot.rsi {
        Some(rsi) => Span::styled(
            format!("{rsi:.1}"),
            Style::default().fg(rsi_color(rsi)).add_modifier(Modifier::BOLD),
        ),
        None => value("--".to_string()),
    };

    let histogram = match (snapshot.macd, snapshot.macd_signal) {
        (Some(line), Some(signal)) => {
            let histogram = line - signal;
            let color = if histogram >= 0.0 { C_UP } else { C_DOWN };
            Span::styled(format!("{histogram:+.4}"), Style::default().fg(color))
        }
        _ => label("--".to_string()),
    };

    let lines = vec![
        Line::from(vec![
            label(format!("SMA{SMA_PERIOD}  ")),
            value(snapshot.sma.map(fmt_price).unwrap_or_else(|| "--".to_string())),
        ]),
        Line::from(vec![
            label(format!("EMA{EMA_SPAN}  ")),
            value(snapshot.ema.map(fmt_price).unwrap_or_else(|| "--".to_string())),
        ]),
        Line::from(vec![label(format!("RSI{RSI_PERIOD}  ")), rsi]),
        Line::from(""),
        Line::from(vec![label("MACD   ".to_string()), value(fmt_opt(snapshot.macd, 4))]),
        Line::from(vec![
            label("Signal ".to_string()),
            value(fmt_opt(snapshot.macd_signal, 4)),
        ]),
        Line::from(vec![label("Hist   ".to_string()), histogram]),
    ];

    f.render_widget(Paragraph::new(lines).block(panel("INDICATORS")), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_skip_warm_up() {
        let points = points(&[f64::NAN, f64::NAN, 3.0, 4.0]);
        assert_eq!(points, vec![(2.0, 3.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_y_bounds() {
        let first: &[(f64, f64)] = &[(0.0, 10.0), (1.0, 20.0)];
        let second: &[(f64, f64)] = &[(0.0, 15.0)];
        let [low, high] = y_bounds(&[first, second]);
        assert!(low < 10.0 && low > 9.0);
        assert!(high > 20.0 && high < 21.0);

        let empty: &[(f64, f64)] = &[];
        assert_eq!(y_bounds(&[empty]), [0.0, 1.0]);

        // Flat series still gets a non-empty range
        let flat: &[(f64, f64)] = &[(0.0, 5.0), (1.0, 5.0)];
        let [low, high] = y_bounds(&[flat]);
        assert!(low < 5.0 && high > 5.0);
    }

    #[test]
    fn test_rsi_color_bands() {
        assert_eq!(rsi_color(75.0), C_DOWN);
        assert_eq!(rsi_color(25.0), C_UP);
        assert_eq!(rsi_color(50.0), C_BRIGHT);
    }
}
