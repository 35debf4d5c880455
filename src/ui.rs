use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use vehicle_inventory::Vehicle;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Year,
    Make,
    Price,
}

impl SortKey {
    pub fn next(&self) -> Self {
        match self {
            SortKey::Id => SortKey::Year,
            SortKey::Year => SortKey::Make,
            SortKey::Make => SortKey::Price,
            SortKey::Price => SortKey::Id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SortKey::Id => "Id",
            SortKey::Year => "Year",
            SortKey::Make => "Make",
            SortKey::Price => "Price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionFilter {
    All,
    Automatic,
    Manual,
    Unknown,
}

impl TransmissionFilter {
    fn matches(&self, vehicle: &Vehicle) -> bool {
        match self {
            TransmissionFilter::All => true,
            TransmissionFilter::Automatic => vehicle.is_automatic == Some(true),
            TransmissionFilter::Manual => vehicle.is_automatic == Some(false),
            TransmissionFilter::Unknown => vehicle.is_automatic.is_none(),
        }
    }

    fn title(&self) -> &str {
        match self {
            TransmissionFilter::All => "all",
            TransmissionFilter::Automatic => "automatic",
            TransmissionFilter::Manual => "manual",
            TransmissionFilter::Unknown => "unknown",
        }
    }
}

pub struct App {
    /// Snapshot in file order
    pub vehicles: Vec<Vehicle>,
    /// Filtered and sorted rows on screen
    pub visible: Vec<Vehicle>,
    pub state: TableState,
    pub show_detail: bool,
    pub sort: SortKey,
    pub filter: TransmissionFilter,
    pub source: String,
}

impl App {
    pub fn new(vehicles: Vec<Vehicle>, source: impl Into<String>) -> Self {
        let mut app = Self {
            visible: Vec::new(),
            vehicles,
            state: TableState::default(),
            show_detail: false,
            sort: SortKey::Id,
            filter: TransmissionFilter::All,
            source: source.into(),
        };
        app.refresh();
        app
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_vehicle(&self) -> Option<&Vehicle> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn apply_filter(&mut self, filter: TransmissionFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(TransmissionFilter::All);
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.refresh();
    }

    /// Rebuild the visible rows and reset selection to the first one
    fn refresh(&mut self) {
        let filter = self.filter;
        let mut rows: Vec<Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();

        match self.sort {
            SortKey::Id => rows.sort_by_key(|v| v.id),
            SortKey::Year => rows.sort_by(|a, b| a.year.cmp(&b.year).then(a.id.cmp(&b.id))),
            SortKey::Make => rows.sort_by(|a, b| {
                a.make
                    .to_lowercase()
                    .cmp(&b.make.to_lowercase())
                    .then_with(|| a.model.to_lowercase().cmp(&b.model.to_lowercase()))
            }),
            SortKey::Price => rows.sort_by(|a, b| a.price.total_cmp(&b.price)),
        }

        self.visible = rows;
        if self.visible.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_SIZE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| i.saturating_sub(PAGE_SIZE))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn stats(&self) -> InventoryStats {
        let mut stats = InventoryStats::default();

        for vehicle in &self.vehicles {
            stats.count += 1;
            stats.total_value += vehicle.price;
            match vehicle.is_automatic {
                Some(true) => stats.automatic += 1,
                Some(false) => stats.manual += 1,
                None => stats.unknown += 1,
            }
        }

        stats
    }
}

#[derive(Debug, Default)]
pub struct InventoryStats {
    pub count: usize,
    pub automatic: usize,
    pub manual: usize,
    pub unknown: usize,
    pub total_value: f64,
}

impl InventoryStats {
    pub fn average_price(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_value / self.count as f64
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("browser failed: {}", err);
        return Err(err.into());
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('s') => app.cycle_sort(),
                KeyCode::Char('a') => app.apply_filter(TransmissionFilter::Automatic),
                KeyCode::Char('m') => app.apply_filter(TransmissionFilter::Manual),
                KeyCode::Char('u') => app.apply_filter(TransmissionFilter::Unknown),
                KeyCode::Char('c') => app.clear_filter(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => {
                    if !app.visible.is_empty() {
                        app.state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !app.visible.is_empty() {
                        app.state.select(Some(app.visible.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let spans = vec![
        Span::styled(
            "Vehicle Inventory",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(app.source.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", stats.count),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!("A {}", stats.automatic),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(format!("M {}", stats.manual), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(format!("? {}", stats.unknown), Style::default().fg(Color::DarkGray)),
        Span::raw("  |  "),
        Span::styled(
            format!("Avg ${:.2}", stats.average_price()),
            Style::default().fg(Color::White),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Year", "Make", "Model", "Price", "Transmission"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.visible.iter().map(|vehicle| {
        let color = match vehicle.is_automatic {
            Some(true) => Color::Green,
            Some(false) => Color::Cyan,
            None => Color::DarkGray,
        };

        let cells = vec![
            Cell::from(vehicle.id.to_string()),
            Cell::from(vehicle.year.to_string()),
            Cell::from(truncate(&vehicle.make, 20)),
            Cell::from(truncate(&vehicle.model, 24)),
            Cell::from(format!("{:.2}", vehicle.price)),
            Cell::from(vehicle.transmission()).style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(22),
            Constraint::Length(26),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Vehicles (sorted by {}) ", app.sort.title())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Yellow);

    let lines = match app.selected_vehicle() {
        Some(vehicle) => vec![
            Line::from(vec![
                Span::styled("Id:           ", label),
                Span::raw(vehicle.id.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Year:         ", label),
                Span::raw(vehicle.year.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Make:         ", label),
                Span::raw(vehicle.make.clone()),
            ]),
            Line::from(vec![
                Span::styled("Model:        ", label),
                Span::raw(vehicle.model.clone()),
            ]),
            Line::from(vec![
                Span::styled("Price:        ", label),
                Span::raw(format!("${:.2}", vehicle.price)),
            ]),
            Line::from(vec![
                Span::styled("Transmission: ", label),
                Span::raw(vehicle.transmission()),
            ]),
        ],
        None => vec![Line::from("No vehicle selected")],
    };

    let detail = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.visible.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.filter != TransmissionFilter::All {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", app.filter.title()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    for (key, action) in [
        ("Enter", " Details"),
        ("s", " Sort"),
        ("a/m/u", " Filter"),
        ("↑/↓", " Nav"),
        ("PgUp/PgDn", " Fast"),
    ] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(action));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
