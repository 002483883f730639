use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::data::{AggregatedDayRecord, QueryParams};
use crate::ui::DashboardColors;

/// The latest aggregated funding rate, shown only on the selected
/// instrument's tile.
pub fn rate_label(
    instrument_id: &str,
    selected: &str,
    latest: Option<&AggregatedDayRecord>,
) -> String {
    match latest {
        Some(latest) if instrument_id == selected => format!("{:.10}%", latest.funding_rate),
        _ => "N/A".to_string(),
    }
}

pub fn render_tiles(
    frame: &mut Frame,
    area: Rect,
    params: &QueryParams,
    latest: Option<&AggregatedDayRecord>,
    cursor: Option<usize>,
    colors: &DashboardColors,
) {
    let instruments = params.visible_instruments();
    if instruments.is_empty() {
        let empty = Paragraph::new("No favorite coins. Switch Type to Full and press (f) on a coin.")
            .style(Style::new().fg(colors.muted_fg))
            .block(Block::bordered().border_style(Style::new().fg(colors.idle_border)));
        frame.render_widget(empty, area);
        return;
    }

    let columns = Layout::horizontal(vec![Constraint::Fill(1); instruments.len()]).split(area);
    for (i, (instrument_id, column)) in instruments.iter().zip(columns.iter()).enumerate() {
        let selected = *instrument_id == params.instrument_id;
        let star = if params.is_favorite(instrument_id) {
            Span::styled("★ ", Style::new().fg(colors.favorite))
        } else {
            Span::styled("☆ ", Style::new().fg(colors.muted_fg))
        };
        let border = if cursor == Some(i) {
            colors.focus_border
        } else {
            colors.idle_border
        };
        let rate = rate_label(instrument_id, &params.instrument_id, latest);
        let rate_color = match latest {
            Some(latest) if selected => colors.funding_rate_color(latest.funding_rate),
            _ => colors.muted_fg,
        };

        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(border))
            .title(Line::from(vec![
                star,
                Span::styled(*instrument_id, Style::new().add_modifier(Modifier::BOLD)),
            ]));
        if selected {
            block = block.style(Style::new().bg(colors.selected_bg));
        }

        let body = Paragraph::new(vec![
            Line::styled("Funding Rate", Style::new().fg(colors.muted_fg)),
            Line::styled(rate, Style::new().fg(rate_color)),
        ])
        .block(block);
        frame.render_widget(body, *column);
    }
}
