use super::{
    C_ACCENT, C_BRIGHT, C_DIM, C_DOWN, C_NEUTRAL, C_UP, change_color,
    chart::{render_indicator_panel, render_price_chart},
    fmt_price, fmt_volume, panel, render_placeholder,
};
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
};
use ynance_data::{
    indicator::IndicatorSet,
    model::{DepthSnapshot, SentimentMarket, SentimentReading},
};

pub(super) fn render_crypto(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(40),
            Constraint::Min(40),
            Constraint::Length(38),
        ])
        .split(area);

    render_tickers(f, app, columns[0]);
    render_chart_column(f, app, columns[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(7),
        ])
        .split(columns[2]);

    let symbol = app.selected_crypto().map(|symbol| symbol.as_str()).unwrap_or("");
    render_depth(f, app.state.depth(symbol), right[0]);
    render_funding(f, app, symbol, right[1]);
    render_markets(f, app, right[2]);
}

fn render_tickers(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected_crypto();
    let rows: Vec<Row> = app
        .config
        .crypto_symbols
        .iter()
        .filter_map(|symbol| app.state.ticker(symbol))
        .map(|ticker| {
            let is_selected = selected == Some(&ticker.symbol);
            let name_style = if is_selected {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_BRIGHT)
            };
            Row::new(vec![
                Cell::from(Span::styled(ticker.symbol.to_string(), name_style)),
                Cell::from(fmt_price(ticker.last_price)),
                Cell::from(Span::styled(
                    format!("{:+.2}%", ticker.change_pct),
                    Style::default().fg(change_color(ticker.change_pct)),
                )),
                Cell::from(Span::styled(
                    fmt_volume(ticker.volume_24h),
                    Style::default().fg(C_DIM),
                )),
            ])
        })
        .collect();

    if rows.is_empty() {
        render_placeholder(f, area, "TICKERS", &["Waiting for ticker stream..."]);
        return;
    }

    let header = Row::new(vec!["Symbol", "Last", "24h", "Vol"])
        .style(Style::default().fg(C_DIM).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(panel("TICKERS"));
    f.render_widget(table, area);
}

fn render_chart_column(f: &mut Frame, app: &App, area: Rect) {
    let Some(symbol) = app.selected_crypto() else {
        render_placeholder(f, area, "CHART", &["No crypto symbols configured (CRYPTO_SYMBOLS)"]);
        return;
    };

    let title = format!("{symbol} {}", app.interval);
    let buffer = app
        .state
        .klines(symbol, app.interval)
        .filter(|buffer| !buffer.is_empty());
    let Some(buffer) = buffer else {
        render_placeholder(f, area, &title, &["Loading klines..."]);
        return;
    };

    let title = if buffer.is_forming() {
        format!("{title} (bar open)")
    } else {
        title
    };

    let rows = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(24)])
        .split(area);

    let closes = buffer.closes();
    let indicators = IndicatorSet::compute(&closes);
    let time_label = |bar: Option<&ynance_data::model::PriceBar>| {
        bar.map(|bar| bar.open_time.format("%m-%d %H:%M").to_string())
            .unwrap_or_default()
    };
    let x_labels = [time_label(buffer.bars().next()), time_label(buffer.last())];

    render_price_chart(f, rows[0], &title, x_labels, &closes, &indicators);
    render_indicator_panel(f, rows[1], &indicators.latest());
}

pub(super) fn render_depth(f: &mut Frame, depth: Option<&DepthSnapshot>, area: Rect) {
    let Some(depth) = depth.filter(|depth| !depth.bids.is_empty() || !depth.asks.is_empty())
    else {
        render_placeholder(f, area, "ORDER BOOK", &["Waiting for depth stream..."]);
        return;
    };

    // Asks above bids, best prices meeting in the middle
    let visible = (area.height.saturating_sub(4) / 2) as usize;
    let level_row = |price: f64, quantity: f64, cumulative: f64, color| {
        Row::new(vec![
            Cell::from(Span::styled(fmt_price(price), Style::default().fg(color))),
            Cell::from(format!("{quantity:.4}")),
            Cell::from(Span::styled(format!("{cumulative:.3}"), Style::default().fg(C_DIM))),
        ])
    };

    let mut rows: Vec<Row> = depth
        .asks
        .iter()
        .take(visible)
        .rev()
        .map(|level| level_row(level.price, level.quantity, level.cumulative, C_DOWN))
        .collect();
    rows.extend(
        depth
            .bids
            .iter()
            .take(visible)
            .map(|level| level_row(level.price, level.quantity, level.cumulative, C_UP)),
    );

    let title = match (depth.spread(), depth.bid_share()) {
        (Some(spread), Some(share)) => {
            format!("ORDER BOOK spread {} bid {:.0}%", fmt_price(spread), share * 100.0)
        }
        _ => "ORDER BOOK".to_string(),
    };

    let header = Row::new(vec!["Price", "Qty", "Cum"])
        .style(Style::default().fg(C_DIM).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(panel(title));
    f.render_widget(table, area);
}

fn render_funding(f: &mut Frame, app: &App, symbol: &str, area: Rect) {
    let Some(funding) = app.state.funding(symbol) else {
        render_placeholder(f, area, "PERP", &["Waiting for mark price..."]);
        return;
    };

    let rate_pct = funding.funding_rate * 100.0;
    let next = funding
        .next_funding_time
        .map(|time| time.format("%H:%M UTC").to_string())
        .unwrap_or_else(|| "--".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled("Mark     ", Style::default().fg(C_DIM)),
            Span::styled(
                fmt_price(funding.mark_price),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Funding  ", Style::default().fg(C_DIM)),
            Span::styled(format!("{rate_pct:+.4}%"), Style::default().fg(change_color(rate_pct))),
        ]),
        Line::from(vec![
            Span::styled("Next     ", Style::default().fg(C_DIM)),
            Span::styled(next, Style::default().fg(C_BRIGHT)),
        ]),
    ];
    f.render_widget(Paragraph::new(lines).block(panel("PERP")), area);
}

pub(super) fn sentiment_line(reading: Option<&SentimentReading>, market: SentimentMarket) -> Line<'static> {
    let label = Span::styled(format!("F&G {:<7}", market.as_str()), Style::default().fg(C_DIM));
    match reading {
        Some(reading) => {
            let color = match reading.value {
                0..=24 => C_DOWN,
                25..=44 => C_NEUTRAL,
                45..=55 => C_BRIGHT,
                _ => C_UP,
            };
            Line::from(vec![
                label,
                Span::styled(
                    format!("{:>3} ", reading.value),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(reading.classification.clone(), Style::default().fg(color)),
            ])
        }
        None => Line::from(vec![label, Span::styled("--", Style::default().fg(C_DIM))]),
    }
}

fn render_markets(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![sentiment_line(
        app.state.sentiment(SentimentMarket::Crypto),
        SentimentMarket::Crypto,
    )];

    match app.state.quote() {
        Some(quote) => lines.push(Line::from(vec![
            Span::styled(format!("Gemini {:<8}", quote.symbol), Style::default().fg(C_DIM)),
            Span::styled(
                format!("{} / {}", fmt_price(quote.bid), fmt_price(quote.ask)),
                Style::default().fg(C_BRIGHT),
            ),
        ])),
        None => lines.push(Line::from(Span::styled(
            app.state.warning("Gemini").unwrap_or("Gemini --").to_string(),
            Style::default().fg(C_DIM),
        ))),
    }

    if app.state.coin_prices().is_empty() {
        lines.push(Line::from(Span::styled(
            app.state.warning("CoinGecko").unwrap_or("CoinGecko --").to_string(),
            Style::default().fg(C_DIM),
        )));
    }
    for coin in app.state.coin_prices() {
        let change = coin.change_24h_pct.unwrap_or(0.0);
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14}", coin.id), Style::default().fg(C_DIM)),
            Span::styled(format!("${:<12}", fmt_price(coin.usd)), Style::default().fg(C_BRIGHT)),
            Span::styled(
                coin.change_24h_pct
                    .map(|pct| format!("{pct:+.2}%"))
                    .unwrap_or_default(),
                Style::default().fg(change_color(change)),
            ),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(panel("MARKETS")),
        area,
    );
}
