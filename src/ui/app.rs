use chrono::Local;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{error, info, warn};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Clear, Paragraph},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{ERROR_POPUP_DURATION_MS, INFO_TEXT, NO_DATA_MESSAGE, PALETTES, POLL_DURATION_MS};
use crate::data::{AggregatedDayRecord, DateRange, FetchKey};
use crate::pipeline::{FetchOutcome, FetchRequest, Pipeline, PipelineState};
use crate::store::FilterStore;
use crate::ui::{
    DashboardColors, SIDEBAR_WIDTH, SidebarRow, render_chart, render_sidebar, render_tiles,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Tiles,
    Chart,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Tiles,
            Focus::Tiles => Focus::Chart,
            Focus::Chart => Focus::Sidebar,
        }
    }
}

pub struct TuiApp {
    store: FilterStore,
    pipeline: Pipeline,
    requests: mpsc::UnboundedSender<FetchRequest>,
    focus: Focus,
    sidebar_cursor: usize,
    tile_cursor: usize,
    hovered_bar: Option<usize>,
    colors: DashboardColors,
    color_index: usize,
    popup: bool,
    popup_message: String,
    error_popup_timer: Option<Instant>,
}

impl TuiApp {
    pub fn new(store: FilterStore, requests: mpsc::UnboundedSender<FetchRequest>) -> Self {
        let hovered_bar = store.aggregated_data().len().checked_sub(1);
        Self {
            store,
            pipeline: Pipeline::new(),
            requests,
            focus: Focus::Tiles,
            sidebar_cursor: 0,
            tile_cursor: 0,
            hovered_bar,
            colors: DashboardColors::new(&PALETTES[0]),
            color_index: 0,
            popup: false,
            popup_message: String::new(),
            error_popup_timer: None,
        }
    }

    /// Issues a fetch when the pipeline's inputs changed since the last one.
    fn refresh_if_needed(&mut self) {
        let key = self.store.params().fetch_key();
        if self.pipeline.needs_fetch(&key) {
            self.request_fetch(key);
        }
    }

    fn request_fetch(&mut self, key: FetchKey) {
        let request = self.pipeline.begin(key);
        info!(
            "Requesting fetch {} for {}",
            request.generation, request.key.instrument_id
        );
        if self.requests.send(request).is_err() {
            warn!("Fetch manager stopped, request dropped");
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        let Some(series) = self.pipeline.complete(outcome) else {
            return;
        };
        let Some(instrument_id) = self.pipeline.current_key().map(|k| k.instrument_id.clone())
        else {
            return;
        };
        self.hovered_bar = series.len().checked_sub(1);
        log_store_error(self.store.set_aggregated_data(&instrument_id, series));
    }

    /// The newest day of the series, only while it is settled and belongs to
    /// the selected instrument.
    fn selected_latest(&self) -> Option<&AggregatedDayRecord> {
        let settled = matches!(
            self.pipeline.state(),
            PipelineState::Idle | PipelineState::Success
        );
        let params = self.store.params();
        if !settled || self.store.aggregated_instrument() != Some(params.instrument_id.as_str()) {
            return None;
        }
        self.store.aggregated_data().last()
    }

    fn visible_instruments(&self) -> Vec<&'static str> {
        self.store.params().visible_instruments()
    }

    fn clamp_tile_cursor(&mut self) {
        let count = self.visible_instruments().len();
        self.tile_cursor = self.tile_cursor.min(count.saturating_sub(1));
    }

    fn next_color(&mut self) {
        self.color_index = (self.color_index + 1) % PALETTES.len();
    }

    fn previous_color(&mut self) {
        let count = PALETTES.len();
        self.color_index = (self.color_index + count - 1) % count;
    }

    fn set_colors(&mut self) {
        self.colors = DashboardColors::new(&PALETTES[self.color_index]);
    }

    fn move_left(&mut self) {
        match self.focus {
            Focus::Sidebar => self.cycle_sidebar_value(),
            Focus::Tiles => self.tile_cursor = self.tile_cursor.saturating_sub(1),
            Focus::Chart => {
                self.hovered_bar = self.hovered_bar.map(|i| i.saturating_sub(1));
            }
        }
    }

    fn move_right(&mut self) {
        match self.focus {
            Focus::Sidebar => self.cycle_sidebar_value(),
            Focus::Tiles => {
                self.tile_cursor += 1;
                self.clamp_tile_cursor();
            }
            Focus::Chart => {
                let last = self.store.aggregated_data().len().checked_sub(1);
                self.hovered_bar = match (self.hovered_bar, last) {
                    (Some(i), Some(last)) => Some((i + 1).min(last)),
                    (None, last) => last,
                    (_, None) => None,
                };
            }
        }
    }

    fn cycle_sidebar_value(&mut self) {
        let params = self.store.params();
        let result = match SidebarRow::ALL[self.sidebar_cursor] {
            SidebarRow::Type => {
                let mode = params.selection_mode.next();
                let result = self.store.set_selection_mode(mode);
                self.tile_cursor = 0;
                result
            }
            SidebarRow::Exchange => {
                let exchange = params.exchange.next();
                self.store.set_exchange(exchange)
            }
            SidebarRow::DateRange => {
                self.open_date_popup();
                Ok(())
            }
            SidebarRow::Time => {
                let granularity = params.granularity.next();
                self.store.set_granularity(granularity)
            }
        };
        log_store_error(result);
    }

    fn next_sidebar_row(&mut self) {
        self.sidebar_cursor = (self.sidebar_cursor + 1) % SidebarRow::ALL.len();
    }

    fn previous_sidebar_row(&mut self) {
        let count = SidebarRow::ALL.len();
        self.sidebar_cursor = (self.sidebar_cursor + count - 1) % count;
    }

    fn select_tile(&mut self) {
        if let Some(instrument_id) = self.visible_instruments().get(self.tile_cursor).copied() {
            log_store_error(self.store.select_instrument(instrument_id));
        }
    }

    /// Only touches favorites, never the selected instrument.
    fn toggle_favorite_tile(&mut self) {
        if let Some(instrument_id) = self.visible_instruments().get(self.tile_cursor).copied() {
            match self.store.toggle_favorite(instrument_id) {
                Ok(favorite) => info!("{instrument_id} favorite: {favorite}"),
                Err(e) => error!("Failed to persist filters: {e:#}"),
            }
            self.clamp_tile_cursor();
        }
    }

    fn shift_date_range(&mut self, shift: impl FnOnce(DateRange) -> DateRange) {
        let range = shift(self.store.params().date_range);
        log_store_error(self.store.set_date_range(range));
    }

    fn open_date_popup(&mut self) {
        self.popup_message.clear();
        self.popup = true;
    }

    fn submit_date_popup(&mut self) {
        self.popup = false;
        match DateRange::parse(&self.popup_message) {
            Some(range) => log_store_error(self.store.set_date_range(range)),
            None => self.error_popup_timer = Some(Instant::now()),
        }
        self.popup_message.clear();
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        if self.popup {
            match key.code {
                KeyCode::Esc => self.popup = false,
                KeyCode::Backspace => {
                    let _ = self.popup_message.pop();
                }
                KeyCode::Enter => self.submit_date_popup(),
                KeyCode::Char(c) => self.popup_message.push(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char('l') | KeyCode::Right if shift => self.next_color(),
            KeyCode::Char('h') | KeyCode::Left if shift => self.previous_color(),
            KeyCode::Char('l') | KeyCode::Right => self.move_right(),
            KeyCode::Char('h') | KeyCode::Left => self.move_left(),
            KeyCode::Char('j') | KeyCode::Down if self.focus == Focus::Sidebar => {
                self.next_sidebar_row()
            }
            KeyCode::Char('k') | KeyCode::Up if self.focus == Focus::Sidebar => {
                self.previous_sidebar_row()
            }
            KeyCode::Enter => match self.focus {
                Focus::Sidebar => self.cycle_sidebar_value(),
                Focus::Tiles => self.select_tile(),
                Focus::Chart => {}
            },
            KeyCode::Char('f') if self.focus == Focus::Tiles => self.toggle_favorite_tile(),
            KeyCode::Char('[') => self.shift_date_range(|r| r.shift_from(-1)),
            KeyCode::Char(']') => self.shift_date_range(|r| r.shift_from(1)),
            KeyCode::Char('{') => self.shift_date_range(|r| r.shift_to(-1)),
            KeyCode::Char('}') => self.shift_date_range(|r| r.shift_to(1)),
            KeyCode::Char('/') => self.open_date_popup(),
            KeyCode::Char('r') => {
                let key = self.store.params().fetch_key();
                self.request_fetch(key);
            }
            _ => {}
        }
        false
    }

    pub fn run(
        mut self,
        mut terminal: DefaultTerminal,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) -> Result<()> {
        loop {
            self.refresh_if_needed();

            // Drain outcomes
            while let Ok(outcome) = outcomes.try_recv() {
                self.apply_outcome(outcome);
            }

            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(POLL_DURATION_MS))? {
                // Drain ALL events, not just one
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key) {
                                return Ok(());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.set_colors();
        frame.render_widget(Block::new().bg(self.colors.buffer_bg), frame.area());

        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
                .areas(frame.area());
        let [header_area, tiles_area, chart_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .areas(main_area);

        render_sidebar(
            frame,
            sidebar_area,
            self.store.params(),
            self.sidebar_cursor,
            self.focus == Focus::Sidebar,
            &self.colors,
        );
        self.render_header(frame, header_area);
        render_tiles(
            frame,
            tiles_area,
            self.store.params(),
            self.selected_latest(),
            (self.focus == Focus::Tiles).then_some(self.tile_cursor),
            &self.colors,
        );
        self.render_chart_area(frame, chart_area);
        self.render_footer(frame, footer_area);

        if self.popup {
            self.render_popup(frame);
        }
        if let Some(error_popup_timer) = self.error_popup_timer {
            if error_popup_timer.elapsed().as_millis() > ERROR_POPUP_DURATION_MS.into() {
                self.error_popup_timer = None;
            } else {
                self.render_popup_invalid(frame);
            }
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(format!(
            "{}  |  Exchange: {}",
            Local::now().format("%B %d %Y"),
            self.store.params().exchange
        )))
        .style(
            Style::new()
                .fg(self.colors.header_fg)
                .bg(self.colors.header_bg),
        )
        .block(Block::bordered().border_type(BorderType::Rounded));
        frame.render_widget(header, area);
    }

    fn render_chart_area(&self, frame: &mut Frame, area: Rect) {
        let message = match self.pipeline.state() {
            PipelineState::Loading => Some(("Loading…".to_string(), self.colors.row_fg)),
            PipelineState::Error(message) => Some((message.clone(), self.colors.negative)),
            PipelineState::Idle | PipelineState::Success
                if self.store.aggregated_data().is_empty() =>
            {
                Some((NO_DATA_MESSAGE.to_string(), self.colors.muted_fg))
            }
            PipelineState::Idle | PipelineState::Success => None,
        };

        match message {
            Some((text, color)) => {
                let paragraph = Paragraph::new(text)
                    .style(Style::new().fg(color))
                    .alignment(Alignment::Center)
                    .block(
                        Block::bordered()
                            .border_type(BorderType::Rounded)
                            .border_style(Style::new().fg(self.colors.idle_border)),
                    );
                frame.render_widget(paragraph, area);
            }
            None => render_chart(
                frame,
                area,
                self.store.aggregated_data(),
                self.store.params().granularity,
                self.hovered_bar,
                self.focus == Focus::Chart,
                &self.colors,
            ),
        }
    }

    fn render_popup(&self, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 20);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(self.popup_message.as_str())
            .block(Block::bordered().title("Date Range (YYYY-MM-DD YYYY-MM-DD)"))
            .style(Style::default())
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_popup_invalid(&self, frame: &mut Frame) {
        let area = popup_area(frame.area(), 40, 20);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new("Invalid date range")
            .block(Block::bordered().title("Date Range"))
            .style(Style::default())
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let info_footer = Paragraph::new(INFO_TEXT.iter().map(|l| Line::from(*l)).collect::<Vec<_>>())
            .style(
                Style::new()
                    .fg(self.colors.row_fg)
                    .bg(self.colors.buffer_bg),
            )
            .centered()
            .block(
                Block::bordered()
                    .border_type(BorderType::Double)
                    .border_style(Style::new().fg(self.colors.footer_border_color)),
            );
        frame.render_widget(info_footer, area);
    }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

fn log_store_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        error!("Failed to persist filters: {e:#}");
    }
}
