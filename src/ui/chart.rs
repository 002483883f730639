use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        Block, BorderType, Clear, Paragraph,
        canvas::{Canvas, Line as CanvasLine, Painter, Shape},
    },
};

use crate::data::{AggregatedDayRecord, Granularity};
use crate::ui::DashboardColors;

const BAR_WIDTH: f64 = 0.8;
const TOOLTIP_WIDTH: u16 = 32;
const TOOLTIP_HEIGHT: u16 = 6;

/// A filled bar from zero up (or down) to `value`.
pub struct FundingBar {
    pub x: f64,
    pub width: f64,
    pub value: f64,
    pub color: Color,
}

impl Shape for FundingBar {
    fn draw(&self, painter: &mut Painter) {
        let (low, high) = if self.value < 0.0 {
            (self.value, 0.0)
        } else {
            (0.0, self.value)
        };
        let Some((left, top)) = painter.get_point(self.x, high) else {
            return;
        };
        let Some((right, bottom)) = painter.get_point(self.x + self.width, low) else {
            return;
        };
        for x in left..=right {
            for y in top..=bottom {
                painter.paint(x, y, self.color);
            }
        }
    }
}

/// Vertical bounds that always include zero, padded so bars never touch the
/// frame.
pub fn y_bounds(series: &[AggregatedDayRecord]) -> [f64; 2] {
    let min = series.iter().map(|d| d.funding_rate).fold(0.0, f64::min);
    let max = series.iter().map(|d| d.funding_rate).fold(0.0, f64::max);
    let span = max - min;
    if span == 0.0 {
        return [-1.0, 1.0];
    }
    let pad = span * 0.1;
    [min - pad, max + pad]
}

pub fn tooltip_lines(record: &AggregatedDayRecord) -> Vec<Line<'static>> {
    vec![
        Line::styled(
            record.calendar_day.clone(),
            Style::new().add_modifier(Modifier::BOLD),
        ),
        Line::from(format!("Funding Rate: {:.10}%", record.funding_rate)),
        Line::from(format!("Realized Rate: {:.10}%", record.realized_rate)),
        Line::from(format!("Interval: {} hours", record.interval_hours)),
    ]
}

pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    series: &[AggregatedDayRecord],
    granularity: Granularity,
    hovered: Option<usize>,
    focused: bool,
    colors: &DashboardColors,
) {
    let border = if focused {
        colors.focus_border
    } else {
        colors.idle_border
    };
    let mut block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(border))
        .title(format!(" Funding Rate ({}) ", granularity.label()));
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        block = block.title_bottom(
            Line::from(format!(" Date Time: {} … {} ", first.calendar_day, last.calendar_day))
                .centered(),
        );
    }

    let n = series.len() as f64;
    let bars: Vec<FundingBar> = series
        .iter()
        .enumerate()
        .map(|(i, day)| FundingBar {
            x: i as f64 + (1.0 - BAR_WIDTH) / 2.0,
            width: BAR_WIDTH,
            value: day.funding_rate,
            color: if hovered == Some(i) {
                colors.hovered
            } else {
                colors.funding_rate_color(day.funding_rate)
            },
        })
        .collect();
    let zero_line = CanvasLine {
        x1: 0.0,
        y1: 0.0,
        x2: n,
        y2: 0.0,
        color: colors.zero_line,
    };

    let canvas = Canvas::default()
        .block(block)
        .background_color(colors.buffer_bg)
        .marker(Marker::HalfBlock)
        .x_bounds([0.0, n.max(1.0)])
        .y_bounds(y_bounds(series))
        .paint(|ctx| {
            for bar in &bars {
                ctx.draw(bar);
            }
            ctx.draw(&zero_line);
        });
    frame.render_widget(canvas, area);

    if let Some((i, record)) = hovered.and_then(|i| series.get(i).map(|r| (i, r))) {
        render_tooltip(frame, tooltip_area(area, i, series.len()), record, colors);
    }
}

/// Places the tooltip in the half of the chart away from the hovered bar.
fn tooltip_area(area: Rect, hovered: usize, count: usize) -> Rect {
    let width = TOOLTIP_WIDTH.min(area.width.saturating_sub(2));
    let height = TOOLTIP_HEIGHT.min(area.height.saturating_sub(2));
    let x = if 2 * hovered + 1 > count {
        area.x + 1
    } else {
        area.right().saturating_sub(width + 1)
    };
    Rect {
        x,
        y: area.y + 1,
        width,
        height,
    }
}

fn render_tooltip(
    frame: &mut Frame,
    tooltip_area: Rect,
    record: &AggregatedDayRecord,
    colors: &DashboardColors,
) {
    frame.render_widget(Clear, tooltip_area);
    let tooltip = Paragraph::new(tooltip_lines(record))
        .style(Style::new().fg(colors.row_fg).bg(colors.buffer_bg))
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::new().fg(colors.funding_rate_color(record.funding_rate))),
        );
    frame.render_widget(tooltip, tooltip_area);
}
