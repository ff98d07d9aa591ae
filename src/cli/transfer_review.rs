use std::collections::HashSet;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{LineGauge, Paragraph},
    Frame,
};

use crate::cli::transfers::CandidateDetail;
use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;
use crate::scorer;
use crate::transfers;
use crate::tui::{confidence_span, money_span, wrap_text, FOOTER_STYLE, HEADER_STYLE, WARNING_STYLE};

enum ReviewState {
    Decide,
    InputReason,
}

enum HandleResult {
    Continue,
    Confirm,
    Reject,
    Done,
}

struct CandidateReviewer {
    queue: Vec<CandidateDetail>,
    current: usize,
    state: ReviewState,
    reason_input: String,
    /// Session-local only: skipped candidates reappear on the next run
    /// unless their stored status changed in the meantime.
    skipped: HashSet<i64>,
    status_message: Option<String>,
}

impl CandidateReviewer {
    fn new(queue: Vec<CandidateDetail>) -> Self {
        Self {
            queue,
            current: 0,
            state: ReviewState::Decide,
            reason_input: String::new(),
            skipped: HashSet::new(),
            status_message: None,
        }
    }

    fn current_detail(&self) -> &CandidateDetail {
        &self.queue[self.current]
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let detail = self.current_detail();
        let candidate = &detail.candidate;
        let total = self.queue.len();
        let width = area.width.saturating_sub(10) as usize;

        let (from_desc, from_lines) = wrap_text(&detail.from_description, width);
        let (to_desc, to_lines) = wrap_text(&detail.to_description, width);

        let [header_area, progress_area, detail_area, factor_area, warn_area, interaction_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(6 + from_lines + to_lines),
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(" Transfer review").style(HEADER_STYLE),
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

        let mut detail_lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::raw(format!("  From  {}  {}  ", detail.from_date, detail.from_account)),
                money_span(-candidate.from_amount.abs()),
                Span::raw(format!(" {}", candidate.from_currency)),
            ]),
        ];
        for l in from_desc.lines() {
            detail_lines.push(Line::from(format!("        {l}")));
        }
        detail_lines.push(Line::from(vec![
            Span::raw(format!("  To    {}  {}  ", detail.to_date, detail.to_account)),
            money_span(candidate.to_amount.abs()),
            Span::raw(format!(" {}", candidate.to_currency)),
        ]));
        for l in to_desc.lines() {
            detail_lines.push(Line::from(format!("        {l}")));
        }
        frame.render_widget(Paragraph::new(detail_lines), detail_area);

        let rate = match (candidate.exchange_rate_used, &candidate.exchange_rate_source) {
            (Some(rate), Some(source)) => format!("{rate} ({source})"),
            (Some(rate), None) => rate.to_string(),
            _ => "—".to_string(),
        };
        let factor_lines = vec![
            Line::from(vec![
                Span::raw("  Confidence:  "),
                confidence_span(candidate.confidence),
            ]),
            Line::from(format!(
                "  Amount match: {}   Rate: {rate}",
                candidate.amount_match_type.as_str()
            )),
            Line::from(format!("  Date gap:     {} day(s)", candidate.date_diff_days)),
            Line::from(format!(
                "  Company:      {}   Keywords: {}",
                if candidate.is_cross_company { "cross" } else { "same" },
                if candidate.has_transfer_keywords { "yes" } else { "no" },
            )),
        ];
        frame.render_widget(Paragraph::new(factor_lines), factor_area);

        let warnings = scorer::validate(candidate);
        let warn_lines: Vec<Line> = warnings
            .iter()
            .map(|w| Line::from(Span::styled(format!("  ⚠ {}", w.describe()), WARNING_STYLE)))
            .collect();
        frame.render_widget(Paragraph::new(warn_lines), warn_area);

        let interaction_lines: Vec<Line> = match self.state {
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
            ReviewState::InputReason => {
                vec![Line::from(format!(
                    "  Reject reason (Enter for default): {}\u{2588}",
                    self.reason_input
                ))]
            }
        };
        frame.render_widget(Paragraph::new(interaction_lines), interaction_area);

        let hints = match self.state {
            ReviewState::Decide => "c=confirm  r=reject  s/Esc=skip  q=quit",
            ReviewState::InputReason => "Enter=reject, Esc=cancel, Ctrl+C=quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> HandleResult {
        match self.state {
            ReviewState::Decide => match code {
                KeyCode::Char('c') | KeyCode::Enter => HandleResult::Confirm,
                KeyCode::Char('r') => {
                    self.reason_input.clear();
                    self.state = ReviewState::InputReason;
                    HandleResult::Continue
                }
                KeyCode::Char('s') | KeyCode::Esc => {
                    self.skipped.insert(self.current_detail().candidate.id);
                    self.advance();
                    self.check_done()
                }
                KeyCode::Char('q') => HandleResult::Done,
                _ => HandleResult::Continue,
            },
            ReviewState::InputReason => match code {
                KeyCode::Char(c) => {
                    self.reason_input.push(c);
                    HandleResult::Continue
                }
                KeyCode::Backspace => {
                    self.reason_input.pop();
                    HandleResult::Continue
                }
                KeyCode::Enter => HandleResult::Reject,
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
        self.reason_input.clear();
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
    let mut conn = get_connection(&db_path())?;
    let queue = crate::cli::transfers::load_details(&conn, Some("pending"))?;

    if queue.is_empty() {
        println!("No pending transfer candidates. Run `reckon transfers detect` first.");
        return Ok(());
    }

    println!("{} candidate(s) to review", queue.len());
    let mut reviewer = CandidateReviewer::new(queue);
    let mut terminal = ratatui::init();

    let result: Result<(usize, usize)> = loop {
        if reviewer.is_done() {
            break Ok((reviewer.skipped.len(), reviewer.current));
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
                    break Ok((reviewer.skipped.len(), reviewer.current));
                }

                match reviewer.handle_key(key.code) {
                    HandleResult::Continue => {}
                    HandleResult::Confirm => {
                        let id = reviewer.current_detail().candidate.id;
                        match transfers::confirm(&mut conn, id) {
                            // No optimistic transition: only a successful
                            // store mutation moves the queue forward.
                            Ok(()) => reviewer.advance(),
                            Err(e) => {
                                reviewer.status_message = Some(format!("Confirm failed: {e}"));
                            }
                        }
                    }
                    HandleResult::Reject => {
                        let id = reviewer.current_detail().candidate.id;
                        let reason = if reviewer.reason_input.trim().is_empty() {
                            None
                        } else {
                            Some(reviewer.reason_input.clone())
                        };
                        match transfers::reject(&conn, id, reason.as_deref()) {
                            Ok(()) => reviewer.advance(),
                            Err(e) => {
                                reviewer.state = ReviewState::Decide;
                                reviewer.status_message = Some(format!("Reject failed: {e}"));
                            }
                        }
                    }
                    HandleResult::Done => break Ok((reviewer.skipped.len(), reviewer.current)),
                }
            }
            Ok(_) => {}
        }
    };

    ratatui::restore();

    match result {
        Ok((skipped, _)) => {
            if skipped > 0 {
                println!("Review done. {skipped} skipped candidate(s) will reappear next time.");
            } else {
                println!("Review done.");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Review error: {e}");
            Err(e)
        }
    }
}
