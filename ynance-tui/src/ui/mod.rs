//! Ratatui rendering. Every function here is a pure read of [`App`].

mod chart;
mod crypto;
mod macros;
mod report;
mod stocks;

use crate::app::{App, Tab};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

pub(crate) const C_UP: Color = Color::Rgb(100, 220, 100);
pub(crate) const C_DOWN: Color = Color::Rgb(220, 100, 100);
pub(crate) const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
pub(crate) const C_DIM: Color = Color::Rgb(120, 120, 120);
pub(crate) const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
pub(crate) const C_ACCENT: Color = Color::Rgb(100, 180, 220);

const KEY_HINTS: &str =
    "q quit | tab/1-4 view | ←/→ select | i interval | r refresh | g daily | w weekly | s save";

/// Draw one frame.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);

    match app.tab {
        Tab::Crypto => crypto::render_crypto(f, app, chunks[1]),
        Tab::Stocks => stocks::render_stocks(f, app, chunks[1]),
        Tab::Macro => macros::render_macro(f, app, chunks[1]),
        Tab::Report => report::render_report(f, app, chunks[1]),
    }

    render_status_bar(f, app, chunks[2]);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(index, tab)| Line::from(format!("{} {}", index + 1, tab.title())))
        .collect();

    let clock = chrono::Local::now().format(" %Y-%m-%d %H:%M:%S ").to_string();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(C_DIM))
        .highlight_style(Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .title(" YNANCE ")
                .title_bottom(Line::from(clock).right_aligned())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        );
    f.render_widget(tabs, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut streams = vec![Span::styled("streams ", Style::default().fg(C_DIM))];
    if app.stream_statuses().is_empty() {
        streams.push(Span::styled("none", Style::default().fg(C_DIM)));
    }
    for (key, state) in app.stream_statuses() {
        let color = if state.is_live() { C_UP } else { C_DOWN };
        streams.push(Span::styled(format!("{key} "), Style::default().fg(C_BRIGHT)));
        streams.push(Span::styled(format!("[{state}]  "), Style::default().fg(color)));
    }

    let message = match (app.status(), app.state.warnings().next()) {
        (Some(status), _) => Span::styled(status.to_string(), Style::default().fg(C_ACCENT)),
        (None, Some(warning)) => Span::styled(warning.clone(), Style::default().fg(C_NEUTRAL)),
        (None, None) => Span::styled(KEY_HINTS, Style::default().fg(C_DIM)),
    };

    let warning_count = app.state.warnings().count();
    let title = if warning_count > 0 {
        format!(" STATUS ({warning_count} warnings) ")
    } else {
        " STATUS ".to_string()
    };

    let paragraph = Paragraph::new(vec![Line::from(streams), Line::from(message)])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        );
    f.render_widget(paragraph, area);
}

/// Bordered panel used by every view.
pub(crate) fn panel(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
}

/// Dimmed placeholder text inside a titled panel.
pub(crate) fn render_placeholder(f: &mut Frame, area: Rect, title: &str, lines: &[&str]) {
    let lines: Vec<Line> = lines
        .iter()
        .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(C_DIM))))
        .collect();
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(panel(title)),
        area,
    );
}

pub(crate) fn change_color(change: f64) -> Color {
    if change > 0.0 {
        C_UP
    } else if change < 0.0 {
        C_DOWN
    } else {
        C_DIM
    }
}

/// Price with precision scaled to magnitude.
pub(crate) fn fmt_price(price: f64) -> String {
    if price >= 1000.0 {
        format!("{price:.2}")
    } else if price >= 1.0 {
        format!("{price:.3}")
    } else {
        format!("{price:.6}")
    }
}

pub(crate) fn fmt_volume(volume: f64) -> String {
    if volume >= 1e9 {
        format!("{:.2}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("{:.2}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{volume:.2}")
    }
}

pub(crate) fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}"),
        None => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use ynance_data::{
        DashboardConfig, FetchUpdate, Fetched, StreamUpdate,
        model::TickerSnapshot,
    };

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(fmt_price(43250.5), "43250.50");
        assert_eq!(fmt_price(2.5), "2.500");
        assert_eq!(fmt_price(0.000123), "0.000123");
        assert_eq!(fmt_volume(2_500_000.0), "2.50M");
        assert_eq!(fmt_volume(999.0), "999.00");
        assert_eq!(fmt_opt(None, 2), "--");
        assert_eq!(fmt_opt(Some(1.23456), 2), "1.23");
    }

    #[test]
    fn test_every_tab_renders_without_data() {
        let mut app = App::new(DashboardConfig::default());
        for tab in Tab::ALL {
            app.tab = tab;
            let screen = draw(&app);
            assert!(screen.contains("YNANCE"));
        }
    }

    #[test]
    fn test_crypto_tab_shows_tickers() {
        let mut app = App::new(DashboardConfig::default());
        app.on_stream(StreamUpdate::Tickers(vec![TickerSnapshot {
            symbol: "BTCUSDT".into(),
            last_price: 43250.5,
            volume_24h: 1200.0,
            change: 250.0,
            change_pct: 0.58,
        }]));

        let screen = draw(&app);
        assert!(screen.contains("BTCUSDT"));
        assert!(screen.contains("43250.50"));
    }

    #[test]
    fn test_missing_credential_placeholder() {
        let mut app = App::new(DashboardConfig::default());
        app.tab = Tab::Stocks;
        app.on_fetch(FetchUpdate::StockDaily {
            symbol: "SPY".into(),
            bars: Fetched::Permanent(ynance_data::DataError::MissingCredential(
                ynance_data::Provider::AlphaVantage,
            )),
        });

        let screen = draw(&app);
        assert!(screen.contains("ALPHA_VANTAGE_API_KEY"));
    }
}
