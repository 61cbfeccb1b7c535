use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, LoginField, NoticeKind, Screen, Sender, CATEGORIES, MENU_ITEMS};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    match app.screen {
        Screen::Home => render_home_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Login => render_login_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Popups (a notice outranks the menu)
    if app.menu_visible && app.screen == Screen::Home {
        render_menu(app, frame, area);
    }
    if app.current_notice().is_some() {
        render_notice(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" TwinkleTalk ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.current_notice().is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Home, _) if app.menu_visible => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" select ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" close ", label_style),
            ],
            (Screen::Home, _) => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" category ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" chat ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" menu ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Chat, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ],
            (Screen::Chat, InputMode::Normal) => vec![
                Span::styled(" i ", key_style),
                Span::styled(" write ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" home ", label_style),
            ],
            (Screen::Login, _) => vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" field ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" sign in ", label_style),
            ],
        }
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_home_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [card_area, heading_area, categories_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    // Greeting card
    let card_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let card_text = Text::from(vec![
        Line::from(Span::styled(
            "Halo, Aku Pinkie!",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(
            "Aku di sini untuk menjawab pertanyaanmu, menginspirasi harimu, \
             menjelajahi dunia baru, dan membagikan resep lezat untuk dicoba.",
        ),
    ]);

    let card = Paragraph::new(card_text)
        .block(card_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(card, card_area);

    let heading = Paragraph::new(Span::styled(
        " Category AI",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(heading, heading_area);

    // Category cards
    let items: Vec<ListItem> = CATEGORIES
        .iter()
        .map(|category| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!(" {} ", category.title),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("   {}", category.blurb),
                    Style::default().fg(Color::Magenta),
                )),
                Line::default(),
            ])
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, categories_area, &mut app.category_state);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat_text = if app.log.is_empty() && !app.submitting() {
        Text::from(Span::styled(
            "Enter Your Query....",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        // Newest-first log, rendered oldest to newest
        for msg in app.log.iter().rev() {
            match msg.sender {
                Sender::User => {
                    lines.push(
                        Line::from(Span::styled(
                            "You:",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ))
                        .alignment(Alignment::Right),
                    );
                    for line in msg.text.lines() {
                        lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                    }
                    lines.push(Line::default());
                }
                Sender::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "TwinkleTalk:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                    lines.push(Line::default());
                }
            }
        }

        if app.submitting() {
            lines.push(Line::from(Span::styled(
                "TwinkleTalk:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    // Draft input at the bottom
    let input_border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Message (i to write, Enter to send) ");

    // Horizontal scroll keeps the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.draft_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_login_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 9.min(area.height.saturating_sub(2));

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Sign in ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions =
        Paragraph::new("Enter your email and session token. Tab switches fields.")
            .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let field_style = |field: LoginField| {
        if app.login_field == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let email_line = Line::from(vec![
        Span::styled("Email: ", field_style(LoginField::Email).bold()),
        Span::styled(app.email_input.as_str(), field_style(LoginField::Email)),
    ]);
    frame.render_widget(
        Paragraph::new(email_line),
        Rect::new(inner.x, inner.y + 2, inner.width, 1),
    );

    // Mask the token (show last 4 chars)
    let display_token = if app.token_input.is_empty() {
        String::new()
    } else if app.token_input.chars().count() <= 4 {
        "*".repeat(app.token_input.chars().count())
    } else {
        let char_count = app.token_input.chars().count();
        let masked_len = char_count - 4;
        let last_four: String = app.token_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };
    let token_line = Line::from(vec![
        Span::styled("Token: ", field_style(LoginField::Token).bold()),
        Span::styled(display_token, field_style(LoginField::Token)),
    ]);
    frame.render_widget(
        Paragraph::new(token_line),
        Rect::new(inner.x, inner.y + 4, inner.width, 1),
    );

    // Cursor on the active field
    let (cursor, row) = match app.login_field {
        LoginField::Email => (app.email_cursor, inner.y + 2),
        LoginField::Token => (app.token_cursor, inner.y + 4),
    };
    let cursor_x = (cursor + 7).min(inner.width.saturating_sub(1) as usize) as u16;
    frame.set_cursor_position((inner.x + cursor_x, row));
}

fn render_menu(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_width = 30.min(area.width.saturating_sub(4));
    let popup_height = (MENU_ITEMS.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Menu ");

    let items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .map(|item| ListItem::new(format!(" {} ", item)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.menu_state);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = app.current_notice() else {
        return;
    };

    let (title, color) = match notice.kind {
        NoticeKind::Error => (" Error ", Color::Red),
        NoticeKind::Success => (" Success ", Color::Green),
    };

    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title);

    let body = Text::from(vec![
        Line::from(notice.text.as_str()),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let popup = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, popup_area);
}
