//! Terminal front end: draws the page panes and routes keys and mouse input
//! into the [`AppContext`].

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use bifocals_application::{AppContext, ClickOutcome, Notice};
use bifocals_core::{FlagKey, PaneId};
use bifocals_engine::layout::truncate_to_width;
use bifocals_engine::{GUTTER, LayoutLine, LineKind, ParagraphMove};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Print;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

const IDLE_TICK: Duration = Duration::from_millis(250);
const FRAME_TICK: Duration = Duration::from_millis(16);
const WHEEL_ROWS: i64 = 3;
const TOC_WIDTH: u16 = 34;
const TOAST_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Paragraph,
    Location,
}

#[derive(Debug, Default)]
struct GotoPanel {
    open: Option<PromptKind>,
    input: String,
    error: Option<String>,
}

impl GotoPanel {
    fn show(&mut self, kind: PromptKind) {
        self.open = Some(kind);
        self.input.clear();
        self.error = None;
    }

    fn close(&mut self) {
        self.open = None;
        self.input.clear();
        self.error = None;
    }
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

/// Screen areas from the last draw, used to map mouse positions back to
/// panes and panel rows.
#[derive(Debug, Clone, Copy, Default)]
struct HitMap {
    panes: [Option<PaneArea>; 2],
    toc: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PaneArea {
    area: Rect,
    /// Column where the paragraph gutter starts.
    text_x: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Pane { pane: PaneId, body_row: u16, col: u16 },
    Toc { panel_row: u16 },
}

impl HitMap {
    fn hit(&self, x: u16, y: u16) -> Option<Hit> {
        if let Some(toc) = self.toc
            && contains(toc, x, y)
        {
            return Some(Hit::Toc {
                panel_row: y - toc.y,
            });
        }
        for (pane, slot) in [PaneId::Primary, PaneId::Mirror].into_iter().zip(self.panes) {
            let Some(slot) = slot else {
                continue;
            };
            if contains(slot.area, x, y) {
                return Some(Hit::Pane {
                    pane,
                    body_row: y - slot.area.y,
                    col: x.saturating_sub(slot.text_x),
                });
            }
        }
        None
    }
}

pub struct Ui {
    ctx: AppContext,
    goto_panel: GotoPanel,
    toast: Option<Toast>,
    hits: HitMap,
}

impl Ui {
    pub fn new(mut ctx: AppContext) -> Self {
        ctx.settings.normalize();
        Self {
            ctx,
            goto_panel: GotoPanel::default(),
            toast: None,
            hits: HitMap::default(),
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Err(err)), _) => Err(err),
            (Ok(_), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        let (cols, rows) = terminal::size().context("query terminal size")?;
        self.ctx.start(cols, rows);
        let mut needs_redraw = true;

        loop {
            if let Some(title) = self.ctx.take_title_change() {
                crossterm::execute!(terminal.backend_mut(), SetTitle(title)).ok();
            }
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                needs_redraw = false;
            }

            let tick_rate = if self.ctx.needs_frame() {
                FRAME_TICK
            } else {
                IDLE_TICK
            };
            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Resize(cols, rows) => self.ctx.resize(cols, rows),
                    Event::Key(key) => {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        if self.handle_key(key) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            let now = Instant::now();
            if let Some(outcome) = self.ctx.on_frame(now) {
                log::trace!("ui: sample {outcome:?}");
            }
            if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
                self.toast = None;
            }
            needs_redraw = true;
        }
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    fn dark(&self) -> bool {
        self.ctx.flags().dark_mode
    }

    fn accent_color(&self) -> Color {
        if self.dark() { Color::Yellow } else { Color::Blue }
    }

    fn base_style(&self) -> Style {
        if self.dark() {
            Style::default().fg(Color::Gray).bg(Color::Black)
        } else {
            Style::default()
        }
    }

    /// Returns true when the reader asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.ctx.notice().is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.ctx.dismiss_notice();
            }
            return false;
        }
        if let Some(kind) = self.goto_panel.open {
            self.handle_goto_panel_key(kind, key);
            return false;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if ctrl => return true,
            KeyCode::Char('g') if ctrl => self.goto_panel.show(PromptKind::Paragraph),
            KeyCode::Char('g') => self.goto_panel.show(PromptKind::Location),
            KeyCode::Up => self.move_paragraph(ParagraphMove::Previous),
            KeyCode::Down => self.move_paragraph(ParagraphMove::Next),
            KeyCode::Home => self.move_paragraph(ParagraphMove::First),
            KeyCode::End => self.move_paragraph(ParagraphMove::Last),
            KeyCode::Char('j') => self.ctx.scroll_rows(PaneId::Primary, 1),
            KeyCode::Char('k') => self.ctx.scroll_rows(PaneId::Primary, -1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.ctx.scroll_pages(PaneId::Primary, 1),
            KeyCode::PageUp => self.ctx.scroll_pages(PaneId::Primary, -1),
            KeyCode::Char('G') => self.ctx.scroll_to_end(),
            KeyCode::Char('0') => self.ctx.scroll_to_start(),
            KeyCode::Char('J') => self.ctx.scroll_toc(1),
            KeyCode::Char('K') => self.ctx.scroll_toc(-1),
            KeyCode::Char('t') => {
                self.ctx.toggle(FlagKey::OpenToc);
            }
            KeyCode::Char('2') => {
                let on = self.ctx.toggle(FlagKey::TwoCols);
                log::info!("ui: two columns {}", if on { "on" } else { "off" });
            }
            KeyCode::Char('d') => {
                self.ctx.toggle(FlagKey::DarkMode);
            }
            KeyCode::Char('y') => self.copy_current_link(),
            KeyCode::Char('[') => {
                if !self.ctx.back() {
                    self.set_toast("No earlier location");
                }
            }
            KeyCode::Char(']') => {
                if !self.ctx.forward() {
                    self.set_toast("No later location");
                }
            }
            _ => {}
        }
        false
    }

    fn handle_goto_panel_key(&mut self, kind: PromptKind, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.goto_panel.close(),
            KeyCode::Enter => {
                let input = self.goto_panel.input.trim().to_string();
                if input.is_empty() {
                    self.goto_panel.error = Some(match kind {
                        PromptKind::Paragraph => "Enter a paragraph number".to_string(),
                        PromptKind::Location => "Enter a location".to_string(),
                    });
                    return;
                }
                match kind {
                    PromptKind::Paragraph => {
                        let Ok(number) = input.parse::<u32>() else {
                            self.goto_panel.error = Some("Invalid paragraph number".to_string());
                            return;
                        };
                        if self.ctx.move_paragraph(ParagraphMove::Number(number)).is_none() {
                            self.goto_panel.error = Some(format!("No paragraph {number}"));
                            return;
                        }
                    }
                    PromptKind::Location => {
                        if !self.ctx.go_to(&input) {
                            self.set_toast("Already there");
                        }
                    }
                }
                self.goto_panel.close();
            }
            KeyCode::Backspace => {
                self.goto_panel.input.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.goto_panel.input.clear();
            }
            KeyCode::Char(ch) if kind == PromptKind::Paragraph && ch.is_ascii_digit() => {
                self.goto_panel.input.push(ch);
            }
            KeyCode::Char(ch) if kind == PromptKind::Location && !ch.is_control() => {
                self.goto_panel.input.push(ch);
            }
            _ => {}
        }
    }

    fn move_paragraph(&mut self, movement: ParagraphMove) {
        if self.ctx.move_paragraph(movement).is_none() {
            log::debug!("ui: no paragraph for {movement:?}");
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(hit) = self.hits.hit(mouse.column, mouse.row) else {
            return;
        };
        match (mouse.kind, hit) {
            (MouseEventKind::ScrollDown, Hit::Pane { pane, .. }) => {
                self.ctx.scroll_rows(pane, WHEEL_ROWS);
            }
            (MouseEventKind::ScrollUp, Hit::Pane { pane, .. }) => {
                self.ctx.scroll_rows(pane, -WHEEL_ROWS);
            }
            (MouseEventKind::ScrollDown, Hit::Toc { .. }) => self.ctx.scroll_toc(WHEEL_ROWS),
            (MouseEventKind::ScrollUp, Hit::Toc { .. }) => self.ctx.scroll_toc(-WHEEL_ROWS),
            (MouseEventKind::Down(MouseButton::Left), Hit::Toc { panel_row }) => {
                self.ctx.click_toc(panel_row);
            }
            (MouseEventKind::Down(MouseButton::Left), Hit::Pane { pane, body_row, col }) => {
                match self.ctx.click_pane(pane, body_row, col) {
                    ClickOutcome::CopyLink { number, url } => self.copy_link(number, &url),
                    ClickOutcome::Navigated | ClickOutcome::Nothing => {}
                }
            }
            _ => {}
        }
    }

    fn copy_current_link(&mut self) {
        match self.ctx.current_permalink() {
            Some((number, url)) => self.copy_link(number, &url),
            None => self.set_toast("No paragraph in view"),
        }
    }

    fn copy_link(&mut self, number: u32, url: &str) {
        match copy_to_clipboard(url) {
            Ok(backend) => {
                log::info!("ui: copied {url} via {backend}");
                self.ctx.acknowledge_copy(number, Instant::now());
                self.set_toast(format!("Copied link to paragraph {number}"));
            }
            Err(err) => {
                log::warn!("ui: clipboard unavailable: {err}");
                self.set_toast(format!("Clipboard error: {err}"));
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Clear, area);
        frame.render_widget(Block::default().style(self.base_style()), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        frame.render_widget(
            Paragraph::new(self.header_line(layout[0].width)).style(self.base_style()),
            layout[0],
        );
        self.draw_body(layout[1], frame);
        frame.render_widget(
            Paragraph::new(self.footer_line())
                .alignment(Alignment::Center)
                .style(self.base_style()),
            layout[2],
        );

        if self.goto_panel.open.is_some() {
            self.draw_goto_panel(area, frame);
        }
        if let Some(notice) = self.ctx.notice() {
            self.draw_notice(notice, area, frame);
        }
    }

    fn header_line(&self, width: u16) -> Line<'static> {
        let fragment = self.ctx.fragment();
        let title_style = Style::default()
            .fg(self.accent_color())
            .add_modifier(Modifier::BOLD);
        let room = usize::from(width).saturating_sub(fragment.width() + 1);
        let title = truncate_to_width(&self.ctx.title(), room);
        let pad = usize::from(width).saturating_sub(title.width() + fragment.width());
        Line::from(vec![
            Span::styled(title, title_style),
            Span::raw(" ".repeat(pad)),
            Span::styled(fragment, Style::default().add_modifier(Modifier::DIM)),
        ])
    }

    fn footer_line(&self) -> Line<'static> {
        if let Some(toast) = &self.toast {
            return Line::from(Span::styled(
                toast.message.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
        Line::from(vec![
            key("↑/↓"),
            Span::raw(" paragraph  "),
            key("Ctrl+g"),
            Span::raw(" goto  "),
            key("g"),
            Span::raw(" location  "),
            key("t"),
            Span::raw(" contents  "),
            key("2"),
            Span::raw(" columns  "),
            key("y"),
            Span::raw(" copy link  "),
            key("[ ]"),
            Span::raw(" history  "),
            key("q"),
            Span::raw(" quit"),
        ])
    }

    fn draw_body(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let dual = self.ctx.is_dual_pane();
        let areas: Vec<Rect> = if dual {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area)
                .to_vec()
        } else {
            vec![area]
        };

        let measure = self.ctx.page().layout().measure;
        let mut hits = HitMap::default();
        for (pane, pane_area) in [PaneId::Primary, PaneId::Mirror].into_iter().zip(areas) {
            let text_x = pane_area.x + text_offset(pane_area.width, measure);
            hits.panes[slot(pane)] = Some(PaneArea {
                area: pane_area,
                text_x,
            });
            self.draw_pane(pane, pane_area, text_x, frame);
        }

        if self.ctx.flags().toc_open {
            let width = TOC_WIDTH.min(area.width / 2);
            let toc_area = Rect { width, ..area };
            self.draw_toc(toc_area, frame);
            hits.toc = Some(toc_area);
        }
        self.hits = hits;
    }

    fn draw_pane(&self, pane: PaneId, area: Rect, text_x: u16, frame: &mut ratatui::Frame) {
        let page = self.ctx.page();
        let now = Instant::now();
        let lines: Vec<Line> = page
            .visible_lines(pane)
            .map(|(_, line)| self.styled_line(line, now))
            .collect();
        let text_area = Rect {
            x: text_x,
            width: area.width.saturating_sub(text_x - area.x),
            ..area
        };
        frame.render_widget(Paragraph::new(Text::from(lines)), text_area);
    }

    fn styled_line(&self, line: &LayoutLine, now: Instant) -> Line<'static> {
        let accent = self.accent_color();
        let gutter = |label: String| Span::styled(label, Style::default().add_modifier(Modifier::DIM));
        let blank_gutter = || Span::raw(" ".repeat(usize::from(GUTTER)));
        let (prefix, style) = match line.kind {
            LineKind::Title => (
                blank_gutter(),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            LineKind::TocHeading | LineKind::SectionHeading(_) => {
                (blank_gutter(), Style::default().add_modifier(Modifier::BOLD))
            }
            LineKind::PartHeading(_) => (
                blank_gutter(),
                Style::default()
                    .fg(accent)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ),
            LineKind::TocEntry(_) => (
                blank_gutter(),
                Style::default().fg(accent).add_modifier(Modifier::UNDERLINED),
            ),
            LineKind::Subheading => (blank_gutter(), Style::default().add_modifier(Modifier::ITALIC)),
            LineKind::Summary(_) => (
                blank_gutter(),
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            ),
            LineKind::Paragraph { index, first: true } => {
                let number = self.ctx.page().document().paragraphs[index].number;
                let copied = self.ctx.shows_copied(number, now);
                (gutter(gutter_label(number, copied)), Style::default())
            }
            LineKind::Paragraph { first: false, .. } | LineKind::Blank => {
                (blank_gutter(), Style::default())
            }
        };
        Line::from(vec![prefix, Span::styled(line.text.clone(), style)])
    }

    fn draw_toc(&self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);
        let page = self.ctx.page();
        let current = page.toc_current();
        let highlight = Style::default()
            .fg(Color::Black)
            .bg(self.accent_color())
            .add_modifier(Modifier::BOLD);
        let inner_width = usize::from(area.width.saturating_sub(1));
        let lines: Vec<Line> = page
            .toc_sections()
            .enumerate()
            .skip(page.toc_scroll())
            .take(usize::from(area.height))
            .map(|(entry, (_, title))| {
                let text = truncate_to_width(title, inner_width);
                if current == Some(entry) {
                    Line::from(Span::styled(text, highlight))
                } else {
                    Line::raw(text)
                }
            })
            .collect();
        let block = Block::default()
            .borders(Borders::RIGHT)
            .style(self.base_style());
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_goto_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(48, 28, area);
        frame.render_widget(Clear, popup_area);

        let (title, label) = match self.goto_panel.open {
            Some(PromptKind::Location) => ("Go to location", "Fragment: "),
            _ => {
                let count = self.ctx.page().document().paragraphs.len();
                if count > 0 {
                    ("Go to paragraph", "Paragraph: ")
                } else {
                    ("Go to paragraph (none)", "Paragraph: ")
                }
            }
        };

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(block.clone(), popup_area);

        let inner = block.inner(popup_area);
        let mut lines = vec![
            Line::from(vec![
                Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(self.goto_panel.input.clone()),
            ]),
            Line::raw(""),
            Line::raw("Enter jumps, Esc cancels, Ctrl+u clears."),
        ];

        if let Some(err) = &self.goto_panel.error {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, inner);
    }

    fn draw_notice(&self, notice: &Notice, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);
        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Notice",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let lines = vec![
            Line::raw(notice.text()),
            Line::raw(""),
            Line::from(Span::styled(
                "Enter or Esc dismisses.",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Center),
            popup_area,
        );
    }
}

fn slot(pane: PaneId) -> usize {
    match pane {
        PaneId::Primary => 0,
        PaneId::Mirror => 1,
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

/// Left padding that centers a text column of `measure` plus the gutter.
fn text_offset(pane_width: u16, measure: u16) -> u16 {
    pane_width.saturating_sub(measure + GUTTER) / 2
}

/// Paragraph number right-aligned in the gutter, or a check mark while the
/// link copy is acknowledged.
fn gutter_label(number: u32, copied: bool) -> String {
    let width = usize::from(GUTTER) - 2;
    let label = if copied {
        "✓".to_string()
    } else {
        number.to_string()
    };
    format!("{label:>width$}  ")
}

fn copy_to_clipboard(text: &str) -> Result<&'static str, String> {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => Ok("system"),
        Err(err) => {
            log::debug!("ui: system clipboard failed ({err}), using osc52");
            let mut stdout = io::stdout();
            crossterm::execute!(stdout, Print(osc52_sequence(text))).map_err(|err| err.to_string())?;
            Ok("osc52")
        }
    }
}

fn osc52_sequence(text: &str) -> String {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_wraps_base64_payload() {
        assert_eq!(
            osc52_sequence("file:///a.md#p3"),
            "\x1b]52;c;ZmlsZTovLy9hLm1kI3Az\x1b\\"
        );
    }

    #[test]
    fn gutter_label_fills_gutter() {
        assert_eq!(gutter_label(7, false), "   7  ");
        assert_eq!(gutter_label(1234, false), "1234  ");
        assert_eq!(gutter_label(7, true), "   ✓  ");
        assert_eq!(gutter_label(7, false).len(), usize::from(GUTTER));
    }

    #[test]
    fn text_column_is_centered_in_pane() {
        assert_eq!(text_offset(100, 40), 27);
        assert_eq!(text_offset(40, 40), 0);
    }

    #[test]
    fn hit_map_prefers_toc_drawer_over_panes() {
        let body = Rect::new(0, 1, 100, 20);
        let hits = HitMap {
            panes: [
                Some(PaneArea {
                    area: Rect::new(0, 1, 50, 20),
                    text_x: 2,
                }),
                Some(PaneArea {
                    area: Rect::new(50, 1, 50, 20),
                    text_x: 52,
                }),
            ],
            toc: Some(Rect { width: 20, ..body }),
        };
        assert_eq!(hits.hit(5, 4), Some(Hit::Toc { panel_row: 3 }));
        assert_eq!(
            hits.hit(30, 4),
            Some(Hit::Pane {
                pane: PaneId::Primary,
                body_row: 3,
                col: 28
            })
        );
        assert_eq!(
            hits.hit(55, 1),
            Some(Hit::Pane {
                pane: PaneId::Mirror,
                body_row: 0,
                col: 3
            })
        );
        assert_eq!(hits.hit(55, 0), None);
    }

    #[test]
    fn centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(48, 28, area);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
    }
}
