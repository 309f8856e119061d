use std::{cell::RefCell, collections::VecDeque, io, rc::Rc, thread, time::Duration};

use anyhow::{Context, Result};
use bazaar_core::{
    CatalogEntry, ItemFilter, ItemRecord, ItemService, ItemType, Purchasable, ServiceEvent,
};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const BULK_QUANTITY: i64 = 5;
const MENU_ITEMS: [&str; 5] = ["Shop", "Inventory", "Save", "Reset Progress", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Cyan,
            selection_fg: Color::Black,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    fn type_color(&self, item_type: ItemType) -> Color {
        match item_type {
            ItemType::Consumable => self.success,
            ItemType::Equipment => self.accent,
            ItemType::Material => self.muted,
            ItemType::Valuable => self.warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Shop,
    Inventory,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal frontend driving an [`ItemService`].
pub struct BazaarApp {
    service: ItemService,
    notifications: Rc<RefCell<VecDeque<ServiceEvent>>>,
    screen: Screen,
    menu_cursor: usize,
    shop: ListCursor,
    shop_filter: ItemFilter,
    inventory: ListCursor,
    inventory_filter: ItemFilter,
    status: String,
    last_saved: Option<DateTime<Local>>,
    should_quit: bool,
    theme: Theme,
}

impl BazaarApp {
    pub fn new(mut service: ItemService) -> Self {
        let notifications = Rc::new(RefCell::new(VecDeque::new()));
        let sink = notifications.clone();
        service.subscribe_all(move |event| sink.borrow_mut().push_back(event.clone()));
        Self {
            service,
            notifications,
            screen: Screen::Menu,
            menu_cursor: 0,
            shop: ListCursor::default(),
            shop_filter: ItemFilter::All,
            inventory: ListCursor::default(),
            inventory_filter: ItemFilter::All,
            status: "Ready".to_string(),
            last_saved: None,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.status = format!(
            "Gold: {} • {} items for sale",
            self.service.currency(),
            self.service.shop_catalog().len()
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => self.handle_input(event),
                Some(AppEvent::Tick) => {}
                None => break,
            }
            self.drain_notifications();
        }

        restore_terminal(&mut terminal)?;
        if self.service.save_state() {
            info!("state saved on exit");
        } else {
            warn!("state could not be saved on exit");
        }
        Ok(())
    }

    fn drain_notifications(&mut self) {
        let pending: Vec<ServiceEvent> = self.notifications.borrow_mut().drain(..).collect();
        for event in pending {
            debug!(kind = %event.kind(), "service notification");
            match event {
                ServiceEvent::ItemPurchased(item) => {
                    self.status = format!(
                        "Purchased {} x{} • Gold: {}",
                        item.name,
                        item.quantity,
                        self.service.currency()
                    );
                }
                ServiceEvent::InventoryChanged => {
                    let len = self.service.inventory_matching(self.inventory_filter).len();
                    self.inventory.clamp(len);
                }
                ServiceEvent::CurrencyChanged(_)
                | ServiceEvent::ItemAdded(_)
                | ServiceEvent::ItemRemoved(_) => {}
            }
        }
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.handle_global_shortcut(&key) {
            return;
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Shop => self.handle_shop_key(key),
            Screen::Inventory => self.handle_inventory_key(key),
        }
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers == KeyModifiers::CONTROL {
            if let KeyCode::Char('c') = key.code {
                self.should_quit = true;
                return true;
            }
        }
        match key.code {
            KeyCode::Char('1') => self.change_screen(Screen::Shop),
            KeyCode::Char('2') => self.change_screen(Screen::Inventory),
            KeyCode::Esc => self.change_screen(Screen::Menu),
            KeyCode::Char('s') if key.modifiers.is_empty() => self.save(),
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            _ => return false,
        }
        true
    }

    fn change_screen(&mut self, screen: Screen) {
        if self.screen == screen {
            return;
        }
        self.screen = screen;
        match screen {
            Screen::Menu => self.status = "Choose where to go".to_string(),
            Screen::Shop => {
                self.shop.clamp(self.visible_catalog().len());
                self.status = format!("Gold: {}", self.service.currency());
            }
            Screen::Inventory => {
                self.inventory.clamp(self.visible_inventory().len());
                self.status = format!("Inventory ({} items)", self.service.inventory().len());
            }
        }
        debug!(?screen, "changed screen");
    }

    fn save(&mut self) {
        if self.service.save_state() {
            let now = Local::now();
            self.status = format!("Saved at {}", now.format("%H:%M:%S"));
            self.last_saved = Some(now);
        } else {
            self.status = "Save failed, see log for details".to_string();
        }
    }

    fn reset_progress(&mut self) {
        if !self.service.gateway().delete_all() {
            self.status = "Failed to delete saved data".to_string();
            return;
        }
        self.service.load_state();
        self.last_saved = None;
        self.status = format!("Progress reset • Gold: {}", self.service.currency());
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1).min(MENU_ITEMS.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Enter => match self.menu_cursor {
                0 => self.change_screen(Screen::Shop),
                1 => self.change_screen(Screen::Inventory),
                2 => self.save(),
                3 => self.reset_progress(),
                _ => self.should_quit = true,
            },
            _ => {}
        }
    }

    fn handle_shop_key(&mut self, key: KeyEvent) {
        let len = self.visible_catalog().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.shop.move_cursor(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.shop.move_cursor(-1, len),
            KeyCode::Home | KeyCode::Char('g') => self.shop.move_to(0, len),
            KeyCode::End | KeyCode::Char('G') => self.shop.move_to(usize::MAX, len),
            KeyCode::Tab => {
                self.shop_filter = self.shop_filter.next();
                self.shop.reset();
                self.status = format!("Filter: {}", self.shop_filter.label());
            }
            KeyCode::BackTab => {
                self.shop_filter = self.shop_filter.previous();
                self.shop.reset();
                self.status = format!("Filter: {}", self.shop_filter.label());
            }
            KeyCode::Enter | KeyCode::Char('b') => self.buy_selected(1),
            KeyCode::Char('B') => self.buy_selected(BULK_QUANTITY),
            _ => {}
        }
    }

    fn buy_selected(&mut self, quantity: i64) {
        let Some(entry) = self.selected_entry().cloned() else {
            self.status = "Nothing to buy".to_string();
            return;
        };
        if !self.service.purchase(&entry, quantity) {
            let name = &entry.record().name;
            self.status = match entry.unit_price() {
                Some(price) => format!(
                    "Cannot afford {name} x{quantity} ({} gold, you have {})",
                    price.saturating_mul(quantity),
                    self.service.currency()
                ),
                None => format!("{name} is not for sale"),
            };
        }
    }

    fn handle_inventory_key(&mut self, key: KeyEvent) {
        let len = self.visible_inventory().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.inventory.move_cursor(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.inventory.move_cursor(-1, len),
            KeyCode::Home | KeyCode::Char('g') => self.inventory.move_to(0, len),
            KeyCode::End | KeyCode::Char('G') => self.inventory.move_to(usize::MAX, len),
            KeyCode::Tab => {
                self.inventory_filter = self.inventory_filter.next();
                self.inventory.reset();
                self.status = format!("Filter: {}", self.inventory_filter.label());
            }
            KeyCode::BackTab => {
                self.inventory_filter = self.inventory_filter.previous();
                self.inventory.reset();
                self.status = format!("Filter: {}", self.inventory_filter.label());
            }
            KeyCode::Char('u') | KeyCode::Enter => self.use_selected(),
            KeyCode::Char('x') => self.discard_selected(1),
            KeyCode::Char('X') => {
                let quantity = self.selected_item().map_or(0, |item| item.quantity);
                self.discard_selected(quantity);
            }
            _ => {}
        }
    }

    fn use_selected(&mut self) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        if item.item_type != ItemType::Consumable {
            self.status = format!("{} cannot be used", item.name);
            return;
        }
        if self.service.remove_item(&item.id, 1) {
            info!(id = %item.id, "item used");
            self.status = format!(
                "Used {} ({} left)",
                item.name,
                self.service.item_quantity(&item.id)
            );
        } else {
            self.status = format!("Failed to use {}", item.name);
        }
    }

    fn discard_selected(&mut self, quantity: i64) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        if self.service.remove_item(&item.id, quantity) {
            self.status = format!("Discarded {} x{quantity}", item.name);
        } else {
            self.status = format!("Failed to discard {}", item.name);
        }
    }

    fn visible_catalog(&self) -> Vec<&CatalogEntry> {
        self.service.shop_catalog_matching(self.shop_filter)
    }

    fn visible_inventory(&self) -> Vec<&ItemRecord> {
        self.service.inventory_matching(self.inventory_filter)
    }

    fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.visible_catalog().get(self.shop.cursor).copied()
    }

    fn selected_item(&self) -> Option<&ItemRecord> {
        self.visible_inventory().get(self.inventory.cursor).copied()
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Menu => self.draw_menu(frame, chunks[1]),
            Screen::Shop => self.draw_shop(frame, chunks[1]),
            Screen::Inventory => self.draw_inventory(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let tab = |label: &'static str, screen: Screen| {
            if self.screen == screen {
                Span::styled(
                    format!(" {label} "),
                    Style::default()
                        .fg(self.theme.selection_fg)
                        .bg(self.theme.selection_bg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {label} "), Style::default().fg(self.theme.muted))
            }
        };
        let line = Line::from(vec![
            tab("Menu", Screen::Menu),
            Span::raw(" "),
            tab("1 Shop", Screen::Shop),
            Span::raw(" "),
            tab("2 Inventory", Screen::Inventory),
            Span::raw("   "),
            Span::styled(
                format!("Gold: {}", self.service.currency()),
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Bazaar"));
        frame.render_widget(header, area);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(area.height);
        let menu_width = 30.min(area.width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, area);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
    }

    fn draw_shop(&mut self, frame: &mut Frame, area: Rect) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let currency = self.service.currency();
        let len = self.service.shop_catalog_matching(self.shop_filter).len();
        self.shop.set_height(body[0].height.saturating_sub(3) as usize, len);

        let entries = self.service.shop_catalog_matching(self.shop_filter);
        let items: Vec<ListItem> = entries
            .iter()
            .enumerate()
            .skip(self.shop.offset)
            .take(self.shop.height)
            .map(|(idx, entry)| {
                let record = entry.record();
                let affordable = self.service.can_purchase(*entry);
                let owned = self.service.item_quantity(&record.id);
                let price_style = if affordable {
                    Style::default().fg(self.theme.success)
                } else {
                    Style::default().fg(self.theme.danger)
                };
                let mut spans = vec![
                    Span::styled(
                        format!("{:<18}", record.name),
                        Style::default().fg(self.theme.type_color(record.item_type)),
                    ),
                    Span::styled(format!("{:>6}g", record.price), price_style),
                ];
                if owned > 0 {
                    spans.push(Span::styled(
                        format!("  owned {owned}"),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                self.list_item(Line::from(spans), idx == self.shop.cursor)
            })
            .collect();

        let list_block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Shop [{}]", self.shop_filter.label()));
        let list_area = render_filter_bar(&self.theme, frame, body[0], self.shop_filter);
        frame.render_widget(List::new(items).block(list_block), list_area);

        let preview = entries.get(self.shop.cursor).map(|entry| {
            let record = entry.record();
            let mut lines = describe(&self.theme, record);
            let verdict = if self.service.can_purchase(*entry) {
                Span::styled("Enter/b buy one, B buy five", Style::default().fg(self.theme.success))
            } else {
                Span::styled(
                    format!("Need {} more gold", record.price - currency),
                    Style::default().fg(self.theme.danger),
                )
            };
            lines.push(Line::from(""));
            lines.push(Line::from(verdict));
            lines
        });
        self.render_preview(frame, body[1], preview);
    }

    fn draw_inventory(&mut self, frame: &mut Frame, area: Rect) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let len = self.service.inventory_matching(self.inventory_filter).len();
        self.inventory
            .set_height(body[0].height.saturating_sub(3) as usize, len);

        let owned = self.service.inventory_matching(self.inventory_filter);
        let items: Vec<ListItem> = owned
            .iter()
            .enumerate()
            .skip(self.inventory.offset)
            .take(self.inventory.height)
            .map(|(idx, item)| {
                let line = Line::from(vec![
                    Span::styled(
                        format!("{:<18}", item.name),
                        Style::default().fg(self.theme.type_color(item.item_type)),
                    ),
                    Span::styled(
                        format!("x{:<4}", item.quantity),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" {}", item.item_type),
                        Style::default().fg(self.theme.muted),
                    ),
                ]);
                self.list_item(line, idx == self.inventory.cursor)
            })
            .collect();

        let title = format!(
            "Inventory ({} items) [{}]",
            self.service.inventory().len(),
            self.inventory_filter.label()
        );
        let list_block = Block::default().borders(Borders::ALL).title(title);
        let list_area = render_filter_bar(&self.theme, frame, body[0], self.inventory_filter);
        if owned.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "Nothing here yet. Visit the shop with 1.",
                Style::default().fg(self.theme.muted),
            )))
            .block(list_block);
            frame.render_widget(empty, list_area);
        } else {
            frame.render_widget(List::new(items).block(list_block), list_area);
        }

        let preview = owned.get(self.inventory.cursor).map(|item| {
            let mut lines = describe(&self.theme, item);
            if let Some(value) = item.stack_value() {
                lines.push(Line::from(format!("Stack value: {value}g")));
            }
            lines.push(Line::from(""));
            let hint = if item.item_type == ItemType::Consumable {
                "u use one, x discard one, X discard all"
            } else {
                "x discard one, X discard all"
            };
            lines.push(Line::from(Span::styled(hint, Style::default().fg(self.theme.muted))));
            lines
        });
        self.render_preview(frame, body[1], preview);
    }

    fn list_item(&self, line: Line<'static>, selected: bool) -> ListItem<'static> {
        let item = ListItem::new(line);
        if selected {
            item.style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg),
            )
        } else {
            item
        }
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect, lines: Option<Vec<Line<'static>>>) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let lines = lines.unwrap_or_else(|| {
            vec![Line::from(Span::styled(
                "No item selected",
                Style::default().fg(self.theme.muted),
            ))]
        });
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let saved = self
            .last_saved
            .map(|at| format!("last saved {}", at.format("%H:%M:%S")))
            .unwrap_or_else(|| "not saved this session".to_string());
        let secondary = format!(
            "1 shop  2 inventory  Esc menu  Tab filter  s save  q quit  •  {saved}"
        );
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn describe(theme: &Theme, record: &ItemRecord) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            record.name.clone(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            record.item_type.to_string(),
            Style::default().fg(theme.type_color(record.item_type)),
        )),
        Line::from(""),
        Line::from(record.description.clone()),
        Line::from(""),
        Line::from(format!("Price: {}g", record.price)),
    ]
}

/// Draw the category bar above a list and return the area left for the list.
fn render_filter_bar(theme: &Theme, frame: &mut Frame, area: Rect, active: ItemFilter) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let mut spans = Vec::new();
    let mut filter = ItemFilter::All;
    loop {
        let style = if filter == active {
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        spans.push(Span::styled(format!(" {} ", filter.label()), style));
        filter = filter.next();
        if filter == ItemFilter::All {
            break;
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    chunks[1]
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Scroll position for a list view.
#[derive(Debug, Default)]
struct ListCursor {
    cursor: usize,
    offset: usize,
    height: usize,
}

impl ListCursor {
    fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn set_height(&mut self, height: usize, len: usize) {
        self.height = height.max(1);
        self.clamp(len);
    }

    fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let target = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = target as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_cursor_visible();
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        if self.cursor >= len {
            self.cursor = len - 1;
        }
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        if self.height == 0 {
            self.offset = 0;
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
    }
}
