use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{LineGauge, Paragraph},
    Frame,
};

use crate::db::get_connection;
use crate::error::Result;
use crate::models::Category;
use crate::query::TxnRow;
use crate::reviewer::{accept_suggestion, apply_category, get_categories, review_queue};
use crate::settings::db_path;
use crate::tui::{money_span, FOOTER_STYLE, HEADER_STYLE};

enum ReviewState {
    Decide,
    PickCategory,
}

enum HandleResult {
    Continue,
    AcceptSuggestion,
    ApplyPicked(usize),
    Done,
}

struct TransactionReviewer {
    queue: Vec<TxnRow>,
    categories: Vec<Category>,
    labels: Vec<String>,
    current: usize,
    state: ReviewState,
    cat_query: String,
    cat_selection: usize,
    status_message: Option<String>,
}

impl TransactionReviewer {
    fn new(queue: Vec<TxnRow>, categories: Vec<Category>) -> Self {
        let labels: Vec<String> = categories
            .iter()
            .map(|c| {
                let tag = match c.category_type.as_str() {
                    "income" => "inc",
                    "transfer" => "xfr",
                    _ => "exp",
                };
                format!("{} ({})", c.name, tag)
            })
            .collect();
        Self {
            queue,
            categories,
            labels,
            current: 0,
            state: ReviewState::Decide,
            cat_query: String::new(),
            cat_selection: 0,
            status_message: None,
        }
    }

    fn current_txn(&self) -> &TxnRow {
        &self.queue[self.current]
    }

    fn filtered_categories(&self) -> Vec<(usize, &str)> {
        if self.cat_query.is_empty() {
            return vec![];
        }
        let q = self.cat_query.to_lowercase();
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.to_lowercase().contains(&q))
            .map(|(i, s)| (i, s.as_str()))
            .take(9)
            .collect()
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let txn = self.current_txn();
        let total = self.queue.len();

        let [header_area, progress_area, detail_area, interaction_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(8),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(" Categorization review").style(HEADER_STYLE),
            header_area,
        );

        let ratio = if total > 1 {
            self.current as f64 / (total - 1) as f64
        } else {
            1.0
        };
        let gauge = LineGauge::default()
            .label(format!("{} of {}", self.current + 1, total))
            .ratio(ratio)
            .filled_style(Style::default().fg(Color::Green).bold())
            .unfilled_style(Style::default().fg(Color::DarkGray))
            .line_set(ratatui::symbols::line::THICK);
        frame.render_widget(gauge, progress_area);

        let suggestion = txn
            .suggested_category
            .clone()
            .unwrap_or_else(|| "(none)".to_string());
        let mut detail_lines = vec![
            Line::from(""),
            Line::from(format!("  Date:        {}", txn.date)),
            Line::from(format!("  Description: {}", txn.description)),
            Line::from(vec![Span::raw("  Amount:      "), money_span(txn.amount)]),
            Line::from(format!("  Account:     {}", txn.account_name)),
            Line::from(format!("  Suggested:   {suggestion}")),
        ];
        if let Some(reason) = &txn.review_reason {
            detail_lines.push(Line::from(Span::styled(
                format!("  Flagged:     {reason}"),
                Style::default().fg(Color::Yellow),
            )));
        }
        frame.render_widget(Paragraph::new(detail_lines), detail_area);

        let interaction_lines: Vec<Line> = match &self.state {
            ReviewState::Decide => {
                let mut lines = Vec::new();
                if let Some(msg) = &self.status_message {
                    lines.push(Line::from(Span::styled(
                        format!("  {msg}"),
                        Style::default().fg(Color::Red),
                    )));
                }
                lines
            }
            ReviewState::PickCategory => {
                let matches = self.filtered_categories();
                let mut lines = vec![Line::from(format!("  Category: {}\u{2588}", self.cat_query))];
                if !self.cat_query.is_empty() && matches.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "    (no matches)",
                        Style::default().fg(Color::DarkGray),
                    )));
                } else {
                    for (i, (_, label)) in matches.iter().enumerate() {
                        let marker = if i == self.cat_selection { ">" } else { " " };
                        lines.push(Line::from(format!("  {marker} {label}")));
                    }
                }
                lines
            }
        };
        frame.render_widget(Paragraph::new(interaction_lines), interaction_area);

        let hints = match &self.state {
            ReviewState::Decide => "a/Enter=accept suggestion  o=other category  s/Esc=skip  q=quit",
            ReviewState::PickCategory => "Type to filter, Enter=select, Esc=back, Ctrl+C=quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> HandleResult {
        match &self.state {
            ReviewState::Decide => match code {
                KeyCode::Char('a') | KeyCode::Enter => {
                    if self.current_txn().suggested_category_id.is_some() {
                        HandleResult::AcceptSuggestion
                    } else {
                        self.status_message =
                            Some("No suggestion on this transaction — press o to pick.".into());
                        HandleResult::Continue
                    }
                }
                KeyCode::Char('o') => {
                    self.cat_query.clear();
                    self.cat_selection = 0;
                    self.state = ReviewState::PickCategory;
                    HandleResult::Continue
                }
                KeyCode::Char('s') | KeyCode::Esc => {
                    self.advance();
                    self.check_done()
                }
                KeyCode::Char('q') => HandleResult::Done,
                _ => HandleResult::Continue,
            },
            ReviewState::PickCategory => match code {
                KeyCode::Char(c) => {
                    self.cat_query.push(c);
                    self.cat_selection = 0;
                    HandleResult::Continue
                }
                KeyCode::Backspace => {
                    self.cat_query.pop();
                    self.cat_selection = 0;
                    HandleResult::Continue
                }
                KeyCode::Up => {
                    self.cat_selection = self.cat_selection.saturating_sub(1);
                    HandleResult::Continue
                }
                KeyCode::Down => {
                    let matches = self.filtered_categories();
                    if !matches.is_empty() {
                        self.cat_selection = (self.cat_selection + 1).min(matches.len() - 1);
                    }
                    HandleResult::Continue
                }
                KeyCode::Enter => {
                    let matches = self.filtered_categories();
                    if matches.is_empty() {
                        HandleResult::Continue
                    } else {
                        let sel = self.cat_selection.min(matches.len() - 1);
                        HandleResult::ApplyPicked(matches[sel].0)
                    }
                }
                KeyCode::Esc => {
                    self.state = ReviewState::Decide;
                    HandleResult::Continue
                }
                _ => HandleResult::Continue,
            },
        }
    }

    fn advance(&mut self) {
        self.current += 1;
        self.state = ReviewState::Decide;
        self.cat_query.clear();
        self.cat_selection = 0;
        self.status_message = None;
    }

    fn check_done(&self) -> HandleResult {
        if self.is_done() {
            HandleResult::Done
        } else {
            HandleResult::Continue
        }
    }

    fn is_done(&self) -> bool {
        self.current >= self.queue.len()
    }
}

pub fn run() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let queue = review_queue(&conn)?;

    if queue.is_empty() {
        println!("No transactions awaiting review.");
        return Ok(());
    }

    let categories = get_categories(&conn)?;
    println!("{} transaction(s) to review", queue.len());

    let mut reviewer = TransactionReviewer::new(queue, categories);
    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if reviewer.is_done() {
            break Ok(());
        }
        if let Err(e) = terminal.draw(|frame| reviewer.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }

                match reviewer.handle_key(key.code) {
                    HandleResult::Continue => {}
                    HandleResult::AcceptSuggestion => {
                        let id = reviewer.current_txn().id;
                        match accept_suggestion(&conn, id) {
                            Ok(()) => reviewer.advance(),
                            Err(e) => {
                                reviewer.status_message = Some(format!("Failed: {e}"));
                            }
                        }
                    }
                    HandleResult::ApplyPicked(label_idx) => {
                        let id = reviewer.current_txn().id;
                        let category_id = reviewer.categories[label_idx].id;
                        match apply_category(&conn, id, category_id) {
                            Ok(()) => reviewer.advance(),
                            Err(e) => {
                                reviewer.state = ReviewState::Decide;
                                reviewer.status_message = Some(format!("Failed: {e}"));
                            }
                        }
                    }
                    HandleResult::Done => break Ok(()),
                }
            }
            Ok(_) => {}
        }
    };

    ratatui::restore();

    match &result {
        Ok(()) => println!("Review complete!"),
        Err(e) => eprintln!("Review error: {e}"),
    }
    result
}
