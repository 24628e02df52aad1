use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use reflex::{
    celebration::Celebration, clock::Clock, engine::PanelShape, summary::SessionSummary,
    RoundPhase,
};

use crate::App;

const SIDEBAR_WIDTH: u16 = 30;
const FOOTER_HEIGHT: u16 = 2;
const PANEL_MARGIN: u16 = 2;

const HELP: &str =
    "space/click: react  s: start/next  p: pause  r: reset  d: difficulty  m: mute  b: save best  c: clear  q: quit";

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn split(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(FOOTER_HEIGHT)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
        .split(rows[0]);
    (cols[0], cols[1], rows[1])
}

/// The clickable reaction panel. Also used for mouse hit-testing.
pub fn panel_rect(area: Rect) -> Rect {
    let (left, _, _) = split(area);
    Rect {
        x: left.x + PANEL_MARGIN.min(left.width / 4),
        y: left.y + (PANEL_MARGIN / 2).min(left.height / 4),
        width: left.width.saturating_sub(PANEL_MARGIN.min(left.width / 4) * 2),
        height: left.height.saturating_sub((PANEL_MARGIN / 2).min(left.height / 4) * 2),
    }
}

fn panel_color(phase: RoundPhase) -> Color {
    match phase {
        RoundPhase::Ready => Color::Green,
        RoundPhase::Waiting => Color::Red,
        RoundPhase::Paused => Color::Yellow,
        _ => Color::DarkGray,
    }
}

fn border_type(shape: PanelShape) -> BorderType {
    match shape {
        PanelShape::Square => BorderType::Plain,
        PanelShape::Circle => BorderType::Rounded,
        PanelShape::Diamond => BorderType::Double,
    }
}

fn format_ms(ms: Option<u64>) -> String {
    ms.map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "-".to_string())
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = &self.engine;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let (_, sidebar, footer) = split(area);
        let panel = panel_rect(area);

        // panel
        let phase = engine.phase();
        let color = panel_color(phase);
        let text = match phase {
            RoundPhase::Countdown => format!("Starting in {}", engine.countdown()),
            _ => engine.message().to_string(),
        };
        let text_style = match phase {
            RoundPhase::Ready | RoundPhase::Waiting => bold_style.fg(Color::Black),
            _ => bold_style,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type(engine.shape()))
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(color));
        let inner = block.inner(panel);
        block.render(panel, buf);

        let top_pad = inner.height.saturating_sub(1) / 2;
        let mut lines: Vec<Line> = (0..top_pad).map(|_| Line::from("")).collect();
        lines.push(Line::from(Span::styled(text, text_style)));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);

        // sidebar
        let session = engine.session();
        let mut side = vec![
            Line::from(Span::styled("REFLEX", bold_style.fg(Color::Cyan))),
            Line::from(""),
            Line::from(format!("Score       {}", session.score)),
            Line::from(format!("Combo       {}", session.combo)),
            Line::from(format!("Time left   {}s", session.seconds_remaining)),
            Line::from(format!("Last        {}", format_ms(engine.last_reaction_ms()))),
            Line::from(format!("Best        {}", format_ms(engine.best_time()))),
            Line::from(format!("Difficulty  {}", engine.difficulty())),
            Line::from(format!(
                "Sound       {}",
                if engine.is_muted() { "off" } else { "on" }
            )),
            Line::from(""),
            Line::from(Span::styled("Leaderboard", bold_style)),
        ];

        let board = self.records.leaderboard();
        if board.is_empty() {
            side.push(Line::from(Span::styled("  no entries", dim_style)));
        }
        for (i, entry) in board.iter().enumerate() {
            let name = truncate(&entry.name, 10);
            side.push(Line::from(format!(
                "{:>2}. {:<10} {:>5} ms",
                i + 1,
                name,
                entry.score
            )));
        }

        if let Some(summary) = &self.last_summary {
            side.push(Line::from(""));
            side.extend(summary_lines(summary, bold_style));
        }

        Paragraph::new(side)
            .block(Block::default().borders(Borders::LEFT))
            .render(sidebar, buf);

        // footer
        Paragraph::new(Span::styled(HELP, dim_style.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(footer, buf);

        if self.celebration.is_active {
            render_celebration(&self.celebration, area, buf);
        }
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.width() <= width {
        return name.to_string();
    }
    let mut out = String::new();
    for ch in name.chars() {
        if (out.clone() + &ch.to_string()).width() >= width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

fn summary_lines(summary: &SessionSummary, bold_style: Style) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled("Last session", bold_style)),
        Line::from(format!("Rounds      {}", summary.rounds)),
        Line::from(format!(
            "On time     {} ({:.0}%)",
            summary.on_time,
            summary.accuracy()
        )),
        Line::from(format!("Early       {}", summary.early)),
        Line::from(format!("Score       {}", summary.score)),
        Line::from(format!("Best        {}", format_ms(summary.best_ms))),
        Line::from(format!("Worst       {}", format_ms(summary.worst_ms))),
        Line::from(format!(
            "Mean        {}",
            summary
                .mean_ms
                .map(|m| format!("{:.0} ms", m))
                .unwrap_or_else(|| "-".to_string())
        )),
    ]
}

fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for spark in &celebration.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let (x, y) = (spark.x as u16, spark.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[spark.color_index % colors.len()];
        let life = 1.0 - spark.age / spark.max_age;
        let style = if spark.anchor.is_some() || life > 0.6 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if life > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }
}
