use super::{C_ACCENT, C_BRIGHT, C_DIM, change_color, chart::y_bounds, panel, render_placeholder};
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Cell, Chart, Dataset, GraphType, Row, Table},
};
use ynance_data::model::SeriesPoint;

/// Short descriptions for the default FRED series.
fn series_label(series_id: &str) -> &'static str {
    match series_id {
        "DGS10" => "10Y Treasury yield",
        "DGS2" => "2Y Treasury yield",
        "CPIAUCSL" => "CPI (all urban)",
        "UNRATE" => "Unemployment rate",
        "FEDFUNDS" => "Fed funds rate",
        "GDP" => "Nominal GDP",
        _ => "",
    }
}

pub(super) fn render_macro(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(app.config.fred_series.len() as u16 + 3),
            Constraint::Min(8),
        ])
        .split(area);

    render_series_table(f, app, rows[0]);
    render_series_chart(f, app, rows[1]);
}

fn render_series_table(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected_series();
    let rows: Vec<Row> = app
        .config
        .fred_series
        .iter()
        .map(|series_id| {
            let name_style = if selected == Some(series_id) {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_BRIGHT)
            };
            let points = app.state.series_points(series_id).unwrap_or_default();

            let mut cells = vec![
                Cell::from(Span::styled(series_id.to_string(), name_style)),
                Cell::from(Span::styled(series_label(series_id), Style::default().fg(C_DIM))),
            ];
            match points {
                [.., previous, last] => {
                    let change = last.value - previous.value;
                    cells.push(Cell::from(format!("{:.2}", last.value)));
                    cells.push(Cell::from(Span::styled(
                        format!("{change:+.2}"),
                        Style::default().fg(change_color(change)),
                    )));
                    cells.push(Cell::from(last.date.to_string()));
                }
                [last] => {
                    cells.push(Cell::from(format!("{:.2}", last.value)));
                    cells.push(Cell::from(""));
                    cells.push(Cell::from(last.date.to_string()));
                }
                [] => {
                    let source = format!("Macro {series_id}");
                    let message = app.state.warning(&source).unwrap_or("--");
                    cells.push(Cell::from(Span::styled(
                        message.to_string(),
                        Style::default().fg(C_DIM),
                    )));
                }
            }
            Row::new(cells)
        })
        .collect();

    let header = Row::new(vec!["Series", "", "Latest", "Chg", "Date"])
        .style(Style::default().fg(C_DIM).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(panel("MACRO (FRED)"));
    f.render_widget(table, area);
}

fn render_series_chart(f: &mut Frame, app: &App, area: Rect) {
    let Some(series_id) = app.selected_series() else {
        render_placeholder(f, area, "SERIES", &["No FRED series configured (FRED_SERIES)"]);
        return;
    };

    let Some(points) = app
        .state
        .series_points(series_id)
        .filter(|points| !points.is_empty())
    else {
        render_placeholder(f, area, series_id, &["No observations yet"]);
        return;
    };

    let data = chart_points(points);
    let [low, high] = y_bounds(&[data.as_slice()]);
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.date.to_string(), last.date.to_string()),
        _ => Default::default(),
    };

    let dataset = Dataset::default()
        .name(series_id.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(C_ACCENT))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(panel(format!("{series_id} {}", series_label(series_id))))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, (data.len().saturating_sub(1)).max(1) as f64])
                .labels([Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([low, high])
                .labels([Span::raw(format!("{low:.2}")), Span::raw(format!("{high:.2}"))]),
        );
    f.render_widget(chart, area);
}

fn chart_points(points: &[SeriesPoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| (index as f64, point.value))
        .collect()
}
