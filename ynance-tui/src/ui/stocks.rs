use super::{
    C_ACCENT, C_BRIGHT, C_DIM, change_color,
    chart::{render_indicator_panel, render_price_chart},
    crypto::sentiment_line,
    fmt_price, fmt_volume, panel, render_placeholder,
};
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Cell, Paragraph, Row, Table},
};
use ynance_data::{
    indicator::IndicatorSet,
    model::{SentimentMarket, closes},
};

pub(super) fn render_stocks(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(40)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(columns[0]);

    render_watchlist(f, app, left[0]);
    f.render_widget(
        Paragraph::new(sentiment_line(
            app.state.sentiment(SentimentMarket::Stock),
            SentimentMarket::Stock,
        ))
        .block(panel("SENTIMENT")),
        left[1],
    );

    render_daily_chart(f, app, columns[1]);
}

fn render_watchlist(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected_stock();
    let rows: Vec<Row> = app
        .config
        .stock_symbols
        .iter()
        .map(|symbol| {
            let name_style = if selected == Some(symbol) {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_BRIGHT)
            };

            let bars = app.state.stock_daily(symbol).unwrap_or_default();
            let (last, change_pct) = match bars {
                [.., previous, last] if previous.close > 0.0 => (
                    fmt_price(last.close),
                    Some((last.close / previous.close - 1.0) * 100.0),
                ),
                [last] => (fmt_price(last.close), None),
                _ => ("--".to_string(), None),
            };
            let volume = bars.last().map(|bar| fmt_volume(bar.volume)).unwrap_or_default();

            Row::new(vec![
                Cell::from(Span::styled(symbol.to_string(), name_style)),
                Cell::from(last),
                Cell::from(Span::styled(
                    change_pct.map(|pct| format!("{pct:+.2}%")).unwrap_or_default(),
                    Style::default().fg(change_color(change_pct.unwrap_or(0.0))),
                )),
                Cell::from(Span::styled(volume, Style::default().fg(C_DIM))),
            ])
        })
        .collect();

    let header = Row::new(vec!["Symbol", "Close", "1d", "Vol"])
        .style(Style::default().fg(C_DIM).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(panel("STOCKS (daily)"));
    f.render_widget(table, area);
}

fn render_daily_chart(f: &mut Frame, app: &App, area: Rect) {
    let Some(symbol) = app.selected_stock() else {
        render_placeholder(f, area, "CHART", &["No stock symbols configured (STOCK_SYMBOLS)"]);
        return;
    };

    let source = format!("Stocks {symbol}");
    let Some(bars) = app.state.stock_daily(symbol).filter(|bars| !bars.is_empty()) else {
        let message = app.state.warning(&source).unwrap_or("Loading daily history...");
        render_placeholder(f, area, symbol, &[message]);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(24)])
        .split(area);

    let closes = closes(bars);
    let indicators = IndicatorSet::compute(&closes);
    let date_label = |index: usize| {
        bars.get(index)
            .map(|bar| bar.open_time.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let x_labels = [date_label(0), date_label(bars.len() - 1)];

    let title = match app.state.warning(&source) {
        Some(_) => format!("{symbol} daily (stale)"),
        None => format!("{symbol} daily"),
    };
    render_price_chart(f, rows[0], &title, x_labels, &closes, &indicators);
    render_indicator_panel(f, rows[1], &indicators.latest());
}

#[cfg(test)]
mod tests {
    use crate::app::{App, Tab};
    use chrono::{TimeZone, Utc};
    use ratatui::{Terminal, backend::TestBackend};
    use ynance_data::{
        DashboardConfig, DataError, FetchUpdate, Fetched, model::PriceBar,
    };

    fn bar(day: u32, close: f64) -> PriceBar {
        let open_time = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap();
        PriceBar::new(open_time, close, close, close, close, 1_000_000.0)
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| crate::ui::render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_stale_history_is_marked() {
        let mut app = App::new(DashboardConfig::default());
        app.tab = Tab::Stocks;
        app.on_fetch(FetchUpdate::StockDaily {
            symbol: "SPY".into(),
            bars: Fetched::Ready((1..=25).map(|day| bar(day, 500.0 + day as f64)).collect()),
        });
        assert!(screen(&app).contains("SPY daily"));
        assert!(!screen(&app).contains("stale"));

        app.on_fetch(FetchUpdate::StockDaily {
            symbol: "SPY".into(),
            bars: Fetched::Transient(DataError::Timeout),
        });
        assert!(screen(&app).contains("SPY daily (stale)"));
    }
}
