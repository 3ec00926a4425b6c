use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use recite::{
    feedback::FeedbackKind,
    line::ListenPhase,
    matcher::WordOutcome,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Practice => render_practice(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_practice(app: &App, area: Rect, buf: &mut Buffer) {
    let rehearsal = &app.rehearsal;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let Some(line) = rehearsal.current_line() else {
        Paragraph::new(Span::styled("This script has no lines.", italic_style))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    };

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_lines = ((line.text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);
    let padding = area.height.saturating_sub(prompt_lines + 8) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1),            // title and progress
                Constraint::Length(padding),
                Constraint::Length(1),            // speaker
                Constraint::Length(prompt_lines), // words
                Constraint::Length(1),
                Constraint::Length(2),            // transcript
                Constraint::Length(1),            // feedback
                Constraint::Min(0),
                Constraint::Length(1),            // stats
                Constraint::Length(1),            // legend
            ]
            .as_ref(),
        )
        .split(area);

    let header = format!(
        "{}  line {}/{}",
        rehearsal.title(),
        rehearsal.current_line_index() + 1,
        rehearsal.lines().len()
    );
    Paragraph::new(Span::styled(header, dim_bold_style))
        .alignment(Alignment::Left)
        .render(chunks[0], buf);

    let completed_marker = if line.is_completed() { " ✓" } else { "" };
    Paragraph::new(Span::styled(
        format!("{}{}", line.character, completed_marker),
        Style::default().fg(Color::Magenta).patch(bold_style),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let words = line.words.iter().map(|w| {
        let style = match w.status {
            WordOutcome::Correct => green_bold_style,
            WordOutcome::Incorrect => red_bold_style,
            WordOutcome::Pending => dim_bold_style,
        };
        Span::styled(w.word.clone(), style)
    });
    let spans = Itertools::intersperse(words, Span::raw(" ")).collect::<Vec<Span>>();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let transcript = match rehearsal.phase() {
        ListenPhase::Listening if rehearsal.current_transcript().is_empty() => {
            "listening...".to_string()
        }
        ListenPhase::Listening => format!("“{}”", rehearsal.current_transcript()),
        ListenPhase::Starting => "starting...".to_string(),
        ListenPhase::Celebrating | ListenPhase::Idle => {
            let phrase = rehearsal.current_transcript();
            if phrase.is_empty() {
                String::new()
            } else {
                format!("“{phrase}”")
            }
        }
    };
    Paragraph::new(Span::styled(transcript, italic_style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    if let Some(feedback) = rehearsal.feedback() {
        let style = match feedback.kind {
            FeedbackKind::Success => green_bold_style,
            FeedbackKind::Retry => Style::default().fg(Color::Yellow).patch(bold_style),
        };
        Paragraph::new(Span::styled(feedback.message.clone(), style))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
    } else if !rehearsal.speech_supported() {
        Paragraph::new(Span::styled(
            "speech recognition unavailable",
            red_bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    let snapshot = rehearsal.snapshot();
    let stats = format!(
        "accuracy {}%  correct {}/{}  missed {}  lines done {}/{}",
        snapshot.accuracy,
        snapshot.correct_words_count,
        snapshot.total_words,
        snapshot.missed_words_count,
        snapshot.completed_lines.len(),
        snapshot.total_lines,
    );
    Paragraph::new(Span::styled(stats, Style::default().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

    let legend = if snapshot.is_listening {
        "(type to speak) (enter) confirm phrase (tab) stop (esc) quit"
    } else {
        "(tab) listen (←) previous (→) skip (home) first line (esc) quit"
    };
    Paragraph::new(Span::styled(legend, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[9], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let rehearsal = &app.rehearsal;
    let stats = rehearsal.stats();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1), // title
                Constraint::Length(1),
                Constraint::Length(1), // accuracy gauge
                Constraint::Length(1),
                Constraint::Length(1), // counts
                Constraint::Min(1),    // missed words
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Span::styled(
        format!("{} complete", rehearsal.title()),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let accuracy = stats.accuracy();
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio((accuracy / 100.0).clamp(0.0, 1.0))
        .label(format!("{accuracy}% accuracy"))
        .render(chunks[2], buf);

    Paragraph::new(Span::raw(format!(
        "{} of {} words correct, {} of {} lines completed",
        stats.correct_words_count(),
        stats.total_words(),
        stats.completed_lines().len(),
        stats.total_lines(),
    )))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    let missed = if stats.missed_words().is_empty() {
        "No missed words.".to_string()
    } else {
        format!("Missed: {}", stats.missed_words().iter().join(", "))
    };
    Paragraph::new(Span::styled(missed, Style::default().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    Paragraph::new(Span::styled("(r)eplay (q)uit", italic_style))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}
