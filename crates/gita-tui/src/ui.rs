use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};

use gita_core::subscribe::CHANNEL_URL;
use gita_core::{Provider, RequestStatus};

use crate::app::{App, Focus, Popup};

const SAFFRON: Color = Color::Rgb(234, 88, 12);
const WHATSAPP_GREEN: Color = Color::Rgb(18, 140, 126);

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, controls, body, status, footer
    let [header_area, controls_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_controls(app, frame, controls_area);
    render_content(app, frame, body_area);
    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);

    match app.popup {
        Some(Popup::About) => render_about(frame, area),
        Some(Popup::Subscribe) => render_subscribe(app, frame, area),
        Some(Popup::ProviderPicker) => render_provider_picker(app, frame, area),
        Some(Popup::ApiKeyInput) => render_api_key_input(app, frame, area),
        None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Gita Modern ", Style::default().fg(SAFFRON).bold()),
        Span::styled("Ancient Wisdom \u{2022} Modern Life", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(
            format!("[{} \u{2022} {}]", app.provider().display_name(), app.model()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn control_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus && app.popup.is_none() {
        Style::default().fg(Color::Black).bg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_controls(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Select a Verse ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selection = app.session.selection();
    let info = app.session.chapter_info();
    let label = Style::default().fg(Color::DarkGray);

    let explain_label = if app.session.is_loading() {
        " Translating... "
    } else {
        " Explain "
    };
    let explain_style = if app.session.is_loading() {
        Style::default().fg(Color::DarkGray).bg(Color::Black)
    } else if app.focus == Focus::Explain && app.popup.is_none() {
        Style::default().fg(Color::White).bg(SAFFRON).bold()
    } else {
        Style::default().fg(SAFFRON).bold()
    };

    let selectors = Line::from(vec![
        Span::styled("Chapter ", label),
        Span::styled(format!(" {}. {} ", info.number, info.name), control_style(app, Focus::Chapter)),
        Span::raw("  "),
        Span::styled("Verse ", label),
        Span::styled(format!(" Verse {} ", selection.verse), control_style(app, Focus::Verse)),
        Span::styled(format!("/{}", info.verse_count), label),
        Span::raw("  "),
        Span::styled("Language ", label),
        Span::styled(format!(" {} ", selection.language), control_style(app, Focus::Language)),
        Span::raw("  "),
        Span::styled(explain_label, explain_style),
    ]);

    let helper = Line::from(Span::styled(
        format!("Chapter {}: {}", info.number, info.translation),
        Style::default().fg(Color::DarkGray).italic(),
    ));

    frame.render_widget(Paragraph::new(vec![selectors, helper]), inner);
}

/// Word-wrap `text` into lines no wider than `width` columns. A word wider
/// than `width` gets a line of its own.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = Span::raw(word).width();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Pre-wrapped lines of `text`, so the scroll height matches what is drawn.
fn wrapped_lines(text: &str, width: u16, style: Style, alignment: Alignment) -> Vec<Line<'static>> {
    wrap_text_to_width(text, width as usize)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, style)).alignment(alignment))
        .collect()
}

/// Rows a word-wrapped paragraph will occupy at `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
            wrap_text_to_width(&text, width)
                .iter()
                .map(|row| Span::raw(row.as_str()).width().max(1).div_ceil(width))
                .sum::<usize>()
        })
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = match app.session.displayed() {
        Some(shown) if !app.session.is_loading() => {
            format!(" Chapter {}, Verse {} ", shown.chapter, shown.verse)
        }
        _ => " Wisdom ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let inner_area = block.inner(area);
    app.content_height = inner_area.height;

    let lines = match app.session.status() {
        RequestStatus::Idle => vec![
            Line::default(),
            Line::from(Span::styled(
                "Select a verse to reveal its timeless wisdom.",
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Center),
        ],
        RequestStatus::Loading => loading_lines(app.animation_frame, inner_area.width),
        RequestStatus::Error(message) => vec![
            Line::default(),
            Line::from(Span::styled("Apologies, seeker.", Style::default().fg(Color::Red).bold()))
                .alignment(Alignment::Center),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))
                .alignment(Alignment::Center),
        ],
        RequestStatus::Success(_) => explanation_lines(app, inner_area.width),
    };

    app.total_content_lines = wrapped_height(&lines, inner_area.width);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0));
    frame.render_widget(paragraph, area);

    if app.total_content_lines > app.content_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_content_lines as usize)
            .position(app.content_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn loading_lines(frame_no: usize, width: u16) -> Vec<Line<'static>> {
    let skeleton = Style::default().fg(Color::DarkGray);
    let bar = |percent: u16| {
        let len = (width as usize * percent as usize / 100).max(1);
        Line::from(Span::styled("\u{2591}".repeat(len), skeleton)).alignment(Alignment::Center)
    };
    let dots = ".".repeat(frame_no % 4);

    vec![
        Line::default(),
        bar(60),
        bar(45),
        Line::default(),
        bar(80),
        bar(70),
        bar(75),
        Line::default(),
        Line::from(Span::styled(
            format!("Consulting the ancient texts{:<3}", dots),
            Style::default().fg(SAFFRON).bold(),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            "Translating wisdom into your language.",
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center),
    ]
}

fn section_heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_uppercase(),
        Style::default().fg(SAFFRON).add_modifier(Modifier::BOLD),
    ))
}

fn explanation_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let (Some(explanation), Some(shown)) = (app.session.explanation(), app.session.displayed()) else {
        return Vec::new();
    };

    let banner = Style::default().fg(Color::White).bg(SAFFRON);
    let speech_indicator = if app.is_speaking() {
        Span::styled(" \u{25a0} Stop ", Style::default().fg(Color::White).bg(Color::Red).bold())
    } else {
        Span::styled(" \u{25b6} Listen ", Style::default().fg(SAFFRON).bold())
    };

    let mut lines = vec![Line::from(Span::styled(" KEY TAKEAWAY ", banner.add_modifier(Modifier::DIM)))];
    let takeaway = format!("\u{201c}{}\u{201d}", explanation.key_takeaway);
    lines.extend(
        wrap_text_to_width(&takeaway, width.saturating_sub(2) as usize)
            .into_iter()
            .map(|row| Line::from(Span::styled(format!(" {} ", row), banner.bold()))),
    );
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("ORIGINAL VERSE ", Style::default().fg(SAFFRON).bold()),
        Span::styled(
            format!(" Ch {} : V {} ", shown.chapter, shown.verse),
            Style::default().fg(Color::Black).bg(Color::Rgb(254, 215, 170)),
        ),
        Span::raw(" "),
        speech_indicator,
    ]));
    lines.extend(wrapped_lines(
        &explanation.sanskrit,
        width,
        Style::default().bold(),
        Alignment::Center,
    ));
    lines.extend(wrapped_lines(
        &explanation.transliteration,
        width,
        Style::default().fg(Color::Gray).italic(),
        Alignment::Center,
    ));
    lines.push(Line::default());
    lines.extend(wrapped_lines(
        &explanation.translation,
        width,
        Style::default().fg(Color::White),
        Alignment::Center,
    ));
    lines.push(Line::default());
    lines.push(section_heading("Modern Context"));
    lines.extend(wrapped_lines(&explanation.modern_context, width, Style::default(), Alignment::Left));
    lines.push(Line::default());
    lines.push(section_heading("Practical Application"));
    lines.extend(wrapped_lines(
        &explanation.practical_application,
        width,
        Style::default(),
        Alignment::Left,
    ));
    lines
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let text = app.notice.as_deref().unwrap_or_default();
    let status = Paragraph::new(Span::styled(format!(" {}", text), Style::default().fg(Color::Yellow)));
    frame.render_widget(status, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let (mode_text, hints): (&str, Vec<[Span; 2]>) = match app.popup {
        Some(Popup::About) => (" ABOUT ", vec![hint("Esc", "close")]),
        Some(Popup::Subscribe) if app.subscription.submitted => (
            " SUBSCRIBE ",
            vec![hint("r", "register another"), hint("Esc", "close")],
        ),
        Some(Popup::Subscribe) => (
            " SUBSCRIBE ",
            vec![hint("Enter", "subscribe"), hint("Esc", "close")],
        ),
        Some(Popup::ProviderPicker) => (
            " PROVIDER ",
            vec![hint("j/k", "nav"), hint("Enter", "select"), hint("Esc", "cancel")],
        ),
        Some(Popup::ApiKeyInput) => (
            " API KEY ",
            vec![hint("Enter", "save"), hint("Esc", "cancel")],
        ),
        None => {
            let mut hints = vec![hint("Tab", "focus"), hint("h/l", "change")];
            if app.focus == Focus::Verse {
                hints.push(hint("H/L", "\u{00b1}10"));
            }
            hints.push(hint("Enter", "explain"));
            if app.session.explanation().is_some() {
                hints.push(hint("p", if app.is_speaking() { "stop" } else { "listen" }));
                hints.push(hint("s", "share"));
                hints.push(hint("j/k", "scroll"));
            }
            hints.extend([
                hint("w", "whatsapp"),
                hint("P", "provider"),
                hint("a", "about"),
                hint("q", "quit"),
            ]);
            (" GITA ", hints)
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, Style::default().bg(SAFFRON).fg(Color::White)),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints.into_iter().flatten())
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Centered popup area, clamped to the screen.
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

const STORY: [&str; 3] = [
    "Books have always been my refuge. From the bustling strategies of modern business to the \
     quiet introspection of philosophy, my library grew as I sought answers on how to navigate \
     this complex life.",
    "Yet, in my reading, a profound realization struck me. The most powerful ideas, whether about \
     leadership, mental resilience, or finding purpose, weren't new. They were echoes. Time and \
     again, the wisdom I found in bestsellers and biographies pointed back to a single, ancient \
     source: the Bhagavad Gita.",
    "I wanted a way to bridge that 5,000-year-old wisdom with the emails, deadlines, and decisions \
     of my 21st-century life. I built this app to be that bridge: a simple tool to access timeless \
     clarity in the midst of modern chaos.",
];

fn render_about(frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 72, 24);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SAFFRON))
        .title(" The Journey Behind Gita Modern ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = Vec::new();
    for paragraph in STORY {
        lines.push(Line::from(Span::styled(paragraph, Style::default().fg(Color::Gray))));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        "\"I hope you enjoy using it as much as I do.\"",
        Style::default().fg(SAFFRON).italic(),
    )));
    lines.push(Line::from(Span::styled("DEVANG SHAH", Style::default().fg(Color::DarkGray).bold())));
    lines.push(Line::default());
    lines.push(
        Line::from(Span::styled("\u{00a9} Gita Modern Wisdom.", Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center),
    );

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        inner.inner(Margin {
            vertical: 0,
            horizontal: 1,
        }),
    );
}

fn render_subscribe(app: &App, frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 64, 17);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(WHATSAPP_GREEN))
        .title(" Daily Wisdom on WhatsApp ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let muted = Style::default().fg(Color::DarkGray);
    let form = &app.subscription;

    let mut lines = vec![
        Line::from(
            "Start your day with clarity. Get one hand-picked verse, its modern meaning, \
             and a practical tip delivered straight to your phone.",
        ),
        Line::from(Span::styled(
            "No Spam \u{2022} 100% Private \u{2022} No Chat Noise",
            Style::default().fg(WHATSAPP_GREEN).bold(),
        )),
        Line::default(),
    ];

    if form.submitted {
        lines.extend([
            Line::from(Span::styled("You're on the list!", Style::default().fg(Color::Green).bold())),
            Line::from(
                "Thank you for subscribing. You will start receiving your daily wisdom shortly.",
            ),
            Line::default(),
            Line::from(Span::styled("Press r to register another number.", muted)),
        ]);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        return;
    }

    lines.extend([
        Line::from(Span::styled("Follow on WhatsApp Channels", Style::default().bold())),
        Line::from(Span::styled(CHANNEL_URL, Style::default().fg(Color::Cyan))),
        Line::from(Span::styled("Found in 'Updates' tab. Your number is hidden.", muted)),
        Line::default(),
        Line::from(Span::styled("Or receive a direct message", muted)),
        Line::from(Span::styled("PHONE NUMBER (WHATSAPP)", muted.bold())),
    ]);

    let [text_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), text_area);

    let input = if form.phone.is_empty() {
        Paragraph::new(Span::styled("+91 98765 43210", muted))
    } else {
        Paragraph::new(Span::styled(form.phone.clone(), Style::default().fg(Color::Cyan)))
    };
    frame.render_widget(input, input_area);

    let cursor_x = form.cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup = popup_area(area, 45, providers.len() as u16 + 2);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Provider ");

    let current = app.provider();
    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.config.key_source(*provider);
            let is_current = *provider == current;

            let status = match key_source {
                Some("env") => "(env var)",
                Some("config") => "(configured)",
                Some("local") => "(local)",
                _ => "(needs key)",
            };
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut app.provider_picker_state);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let provider_name = app
        .api_key_target_provider
        .map(|p| p.display_name())
        .unwrap_or("Provider");

    let popup = popup_area(area, 60, 6);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Enter API Key for {} ", provider_name));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let instructions = Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 2));

    let input_area = Rect::new(inner.x, inner.y + 3, inner.width, 1);
    frame.render_widget(
        Paragraph::new(mask_key(&app.api_key_input)).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

/// Show only the last four characters of a key.
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let last_four: String = key.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), last_four)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{explanation, settle, show_explanation, test_app, CountingVoice};
    use gita_core::Explanation;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw_text(&mut terminal, app)
    }

    fn draw_text(terminal: &mut Terminal<TestBackend>, app: &mut App) -> String {
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key("sk-123456"), "*****3456");
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("a".repeat(25)), Line::default(), Line::from("short")];
        assert_eq!(wrapped_height(&lines, 10), 5);

        // Word wrapping needs a third row where a character count says two
        let words = vec![Line::from("aaaaaa bbbbbb cccccc")];
        assert_eq!(wrapped_height(&words, 10), 3);
    }

    #[test]
    fn test_wrap_text_to_width() {
        assert_eq!(
            wrap_text_to_width("focus on  the effort", 9),
            vec!["focus on", "the", "effort"]
        );
        assert_eq!(wrap_text_to_width("", 9), vec![String::new()]);
        assert_eq!(wrap_text_to_width("unbreakable word", 4), vec!["unbreakable", "word"]);
    }

    #[tokio::test]
    async fn test_loading_screen() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        let text = screen_text(&mut app);
        assert!(text.contains("Translating..."));
        assert!(text.contains("Consulting the ancient texts"));
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_error_screen() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        let text = screen_text(&mut app);
        assert!(text.contains("Apologies, seeker."));
        assert!(text.contains(" Explain "));
    }

    #[tokio::test]
    async fn test_explanation_screen_shows_displayed_verse() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        show_explanation(&mut app);
        let shown = app.session.displayed().unwrap().clone();

        // Changing the selection does not relabel the shown explanation
        app.focus = Focus::Chapter;
        app.next_value();

        let text = screen_text(&mut app);
        assert!(text.contains(&format!("Ch {} : V {}", shown.chapter, shown.verse)));
        assert!(text.contains("KEY TAKEAWAY"));
        assert!(text.contains("Do the work, release the result."));
        assert!(text.contains("karmaṇy evādhikāras te mā phaleṣu kadācana"));
        assert!(text.contains("You have a right to your actions, never to their fruits."));
        assert!(text.contains("MODERN CONTEXT"));
        assert!(text.contains("Focus on the effort you control."));
        assert!(text.contains("PRACTICAL APPLICATION"));
        assert!(text.contains("Prepare well, then let go of the outcome."));

        // Devanagari clusters span cells unevenly, so check the lines directly
        let lines = explanation_lines(&app, 118);
        let sanskrit = explanation().sanskrit;
        assert!(lines
            .iter()
            .any(|line| line.spans.iter().any(|span| span.content == sanskrit)));
    }

    #[tokio::test]
    async fn test_narrow_terminal_scrolls_to_end_of_explanation() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        let request = app.session.request().unwrap();
        let long = Explanation {
            practical_application: format!("{} FINALWORD", "abcdefgh ".repeat(40)),
            ..explanation()
        };
        assert!(app.session.resolve(request.id, Ok(long)));

        let mut terminal = Terminal::new(TestBackend::new(24, 20)).unwrap();
        let text = draw_text(&mut terminal, &mut app);
        assert!(!text.contains("FINALWORD"));
        assert!(app.total_content_lines > app.content_height);

        for _ in 0..app.total_content_lines {
            app.scroll_down();
        }
        assert_eq!(app.content_scroll, app.total_content_lines - app.content_height);
        let text = draw_text(&mut terminal, &mut app);
        assert!(text.contains("FINALWORD"));
    }

    #[tokio::test]
    async fn test_about_popup() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        app.open_about();
        let text = screen_text(&mut app);
        assert!(text.contains("The Journey Behind Gita Modern"));
        assert!(text.contains("Books have always been my refuge."));
        assert!(text.contains("\u{00a9} Gita Modern Wisdom."));
    }

    #[tokio::test]
    async fn test_subscribe_popup() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        app.open_subscribe();
        assert!(screen_text(&mut app).contains("Daily Wisdom on WhatsApp"));

        "+919876543210".chars().for_each(|c| app.subscription.insert(c));
        app.subscription.submit();
        assert!(screen_text(&mut app).contains("You're on the list!"));
    }
}
