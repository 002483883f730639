use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::data::QueryParams;
use crate::ui::DashboardColors;

/// Fits the cursor marker and a full date range between the borders.
pub const SIDEBAR_WIDTH: u16 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow {
    Type,
    Exchange,
    DateRange,
    Time,
}

impl SidebarRow {
    pub const ALL: [SidebarRow; 4] = [
        SidebarRow::Type,
        SidebarRow::Exchange,
        SidebarRow::DateRange,
        SidebarRow::Time,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SidebarRow::Type => "Type",
            SidebarRow::Exchange => "Exchange",
            SidebarRow::DateRange => "Date Range",
            SidebarRow::Time => "Time",
        }
    }

    pub fn value(&self, params: &QueryParams) -> String {
        match self {
            SidebarRow::Type => params.selection_mode.label().to_string(),
            SidebarRow::Exchange => params.exchange.label().to_string(),
            SidebarRow::DateRange => format!(
                "{} - {}",
                params.date_range.from.format("%b %d, %Y"),
                params.date_range.to.format("%b %d, %Y")
            ),
            SidebarRow::Time => params.granularity.label().to_string(),
        }
    }
}

pub fn render_sidebar(
    frame: &mut Frame,
    area: Rect,
    params: &QueryParams,
    cursor: usize,
    focused: bool,
    colors: &DashboardColors,
) {
    let mut lines = Vec::with_capacity(SidebarRow::ALL.len() * 3);
    for (i, row) in SidebarRow::ALL.iter().enumerate() {
        let marker = if focused && i == cursor { "▶ " } else { "  " };
        let value_style = if i == cursor {
            Style::new()
                .fg(colors.focus_border)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(colors.row_fg)
        };
        lines.push(Line::styled(
            row.title(),
            Style::new().fg(colors.muted_fg),
        ));
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(row.value(params), value_style),
        ]));
        lines.push(Line::default());
    }

    let border = if focused {
        colors.focus_border
    } else {
        colors.idle_border
    };
    let sidebar = Paragraph::new(lines)
        .style(Style::new().fg(colors.row_fg).bg(colors.buffer_bg))
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::new().fg(border))
                .title(" Filters "),
        );
    frame.render_widget(sidebar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::data::DateRange;
    use ratatui::{Terminal, backend::TestBackend, style::palette::tailwind};

    #[test]
    fn test_row_values() {
        let mut params = QueryParams::default();
        params.date_range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
        );

        assert_eq!(SidebarRow::Type.value(&params), "Full");
        assert_eq!(SidebarRow::Exchange.value(&params), "OKX");
        assert_eq!(
            SidebarRow::DateRange.value(&params),
            "Nov 01, 2024 - Nov 03, 2024"
        );
        assert_eq!(SidebarRow::Time.value(&params), "1D");
    }

    #[test]
    fn test_date_range_fits_sidebar() {
        let mut params = QueryParams::default();
        params.date_range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 10, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        let colors = DashboardColors::new(&tailwind::BLUE);
        let mut terminal = Terminal::new(TestBackend::new(SIDEBAR_WIDTH, 14)).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_sidebar(frame, area, &params, 2, true, &colors)
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect()
            })
            .collect();
        assert!(
            rows.iter()
                .any(|row| row.contains("▶ Oct 15, 2024 - Dec 31, 2024")),
            "{rows:#?}"
        );
    }
}
