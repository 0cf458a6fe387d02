use super::{C_ACCENT, C_BRIGHT, C_DIM, C_NEUTRAL, panel, render_placeholder};
use crate::app::App;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use ynance_data::report::ReportSource;

pub(super) fn render_report(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(40)])
        .split(area);

    render_archive(f, app, columns[0]);

    let Some(report) = app.selected_report() else {
        let hint = match app.drafting() {
            Some(kind) => format!("Drafting {kind} report..."),
            None => "Press g for a daily report or w for a weekly report".to_string(),
        };
        render_placeholder(f, columns[1], "REPORT", &[hint.as_str()]);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} ({})", report.title, report.date),
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(report.body.lines().map(|line| {
        if line.starts_with('#') {
            Line::from(Span::styled(
                line.trim_start_matches('#').trim().to_string(),
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(line.to_string())
        }
    }));

    let title = match report.source {
        ReportSource::Model => format!("REPORT {}", report.file_name()),
        ReportSource::Fallback => format!("REPORT {} (fallback)", report.file_name()),
    };
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel(title)),
        columns[1],
    );
}

fn render_archive(f: &mut Frame, app: &App, area: Rect) {
    let reports = app.state.reports();
    if reports.is_empty() {
        render_placeholder(f, area, "SESSION REPORTS", &["None yet"]);
        return;
    }

    let lines: Vec<Line> = reports
        .iter()
        .enumerate()
        .map(|(index, report)| {
            let style = if index == app.report_index() {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_BRIGHT)
            };
            let marker = match report.source {
                ReportSource::Model => Span::raw(""),
                ReportSource::Fallback => Span::styled(" fallback", Style::default().fg(C_NEUTRAL)),
            };
            Line::from(vec![
                Span::styled(format!("{} {}", report.date, report.kind), style),
                marker,
            ])
        })
        .chain(std::iter::once(Line::from(Span::styled(
            "s saves the highlighted report",
            Style::default().fg(C_DIM),
        ))))
        .collect();

    f.render_widget(Paragraph::new(lines).block(panel("SESSION REPORTS")), area);
}
