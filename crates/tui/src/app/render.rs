use super::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        if let Some(ref onboarding) = self.onboarding {
            self.render_onboarding(frame, area, onboarding);
            return;
        }

        if self.show_help {
            self.render_help(frame, area);
            return;
        }

        self.layout.calculate_layout(area, self.widgets.len());

        let panels = self.layout.get_panels().to_vec();

        for panel in panels {
            match panel.panel_type {
                PanelType::Topbar => self.render_topbar(frame, panel.rect),
                PanelType::Widgets => self.render_widgets(frame),
                PanelType::Items => self.render_items(frame, panel.rect),
                PanelType::StatusBar => self.render_status_bar(frame, panel.rect),
            }
        }

        if self.show_error_details {
            self.render_error_details(frame, area);
        }
    }

    fn render_onboarding(&self, frame: &mut Frame, area: Rect, state: &OnboardingState) {
        let content = match state.current_screen {
            OnboardingScreen::Welcome => {
                "\n\n  Welcome to connect-hub!\n\n  Connect Airtable, HubSpot and Notion through your backend.\n\n  First, tell us who is connecting.\n\n  Press [Enter] to continue, [Esc] to quit\n".to_owned()
            }
            OnboardingScreen::Identity => {
                let field = |value: &str, selected: bool| {
                    let shown = if value.is_empty() { "[not set]" } else { value };
                    if selected {
                        format!("{} [editing]", shown)
                    } else {
                        shown.to_string()
                    }
                };
                format!(
                    "\n\n  Enter your identity:\n\n  User ID: {}\n  Org ID:  {}\n\n  {}\n\n  Press [Tab] to switch fields,\n  type to enter values,\n  [Enter] to continue, [Esc] to go back\n",
                    field(&state.user_id, state.selected_field == 0),
                    field(&state.org_id, state.selected_field == 1),
                    state.error_message.as_deref().unwrap_or("")
                )
            }
            OnboardingScreen::Complete => {
                "\n\n  Setup Complete!\n\n  Press [Enter] to open your integrations.\n\n".to_owned()
            }
        };

        let title = match state.current_screen {
            OnboardingScreen::Welcome => "Welcome",
            OnboardingScreen::Identity => "Identity",
            OnboardingScreen::Complete => "Complete!",
        };

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Onboarding - {} ", title)),
            )
            .centered();
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help_text = self.keybinds.help_text();
        let popup_area = self.centered_rect(60, 70, area);

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(help_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help - Press ? to close "),
            ),
            popup_area,
        );
    }

    fn render_topbar(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(" connect-hub ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(
                " {} @ {}  |  {}  |  ? help",
                self.config.identity.user_id,
                self.config.identity.org_id,
                self.config.backend.base_url
            )),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
            area,
        );
    }

    fn render_widgets(&self, frame: &mut Frame) {
        let cards = self.layout.card_rects().to_vec();
        for (index, (widget, rect)) in self.widgets.iter().zip(cards).enumerate() {
            let selected = index == self.selected;
            let (text_style, hint) = match widget.state() {
                ConnectionState::Idle
                    if self.restored_credentials.contains_key(&widget.provider()) =>
                {
                    (
                        Style::default().fg(Color::Cyan),
                        "[Enter] reconnect  [l] load saved session",
                    )
                }
                ConnectionState::Idle => (Style::default().fg(Color::Cyan), "[Enter] connect"),
                ConnectionState::Authorizing => (Style::default().fg(Color::Yellow), ""),
                ConnectionState::AwaitingCallback => match widget.config().redirect {
                    RedirectStrategy::Popup => {
                        (Style::default().fg(Color::Yellow), "[d] done in browser")
                    }
                    RedirectStrategy::FullPageNavigate => {
                        (Style::default().fg(Color::Yellow), "[f] fetch credentials")
                    }
                },
                ConnectionState::Connected => (Style::default().fg(Color::Green), "[l] load items"),
                ConnectionState::Error => (Style::default().fg(Color::Red), "[Enter] retry"),
            };

            let mut lines = vec![Line::from(Span::styled(widget.display_text(), text_style))];
            if let Some(status) = widget.status_message() {
                lines.push(Line::from(Span::styled(
                    status.to_string(),
                    Style::default().fg(Color::Green),
                )));
            }
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )));

            let border_style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let title = if selected {
                format!("> {} ", widget.provider())
            } else {
                format!(" {} ", widget.provider())
            };
            frame.render_widget(
                Paragraph::new(lines).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(title),
                ),
                rect,
            );
        }
    }

    fn render_items(&self, frame: &mut Frame, area: Rect) {
        let provider = self.selected_widget().map(|w| w.provider());
        let title = match provider {
            Some(p) if self.loading_items == Some(p) => format!(" {} items (loading...) ", p),
            Some(p) => format!(" {} items ", p),
            None => " Items ".to_string(),
        };

        let items: Vec<ListItem> = provider
            .and_then(|p| self.items.get(&p))
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.visibility)
                    .map(|item| {
                        let modified = item
                            .last_modified_time
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        ListItem::new(Line::from(vec![
                            Span::raw(item.display_name()),
                            Span::styled(
                                format!("  {}", modified),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]))
                    })
                    .collect()
            })
            .unwrap_or_default();

        frame.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match (&self.last_error, &self.status_message) {
            (Some(err), _) => (
                format!("{}  (Shift+E for details)", err),
                Style::default().fg(Color::Red),
            ),
            (None, Some(status)) => (status.clone(), Style::default().fg(Color::Green)),
            (None, None) => (String::new(), Style::default()),
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(style)
                .block(Block::default().borders(Borders::ALL).title(" Status ")),
            area,
        );
    }

    fn render_error_details(&self, frame: &mut Frame, area: Rect) {
        let popup_area = self.centered_rect(70, 40, area);
        let text = self.last_error.clone().unwrap_or_default();

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: true }).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Error details - Esc to close "),
            ),
            popup_area,
        );
    }

    fn centered_rect(&self, percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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
}
