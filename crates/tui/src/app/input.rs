use super::*;

impl App {
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Resize(_, _) => Ok(false),
            _ => Ok(false),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if let Some(ref mut onboarding) = self.onboarding {
            match key.code {
                KeyCode::Enter => {
                    if matches!(onboarding.current_screen, OnboardingScreen::Complete) {
                        self.complete_onboarding();
                    } else {
                        onboarding.next_screen();
                    }
                }
                KeyCode::Esc => {
                    if matches!(onboarding.current_screen, OnboardingScreen::Welcome) {
                        self.should_quit = true;
                    }
                    onboarding.previous_screen();
                }
                KeyCode::Tab => {
                    if matches!(onboarding.current_screen, OnboardingScreen::Identity) {
                        onboarding.toggle_field();
                    }
                }
                KeyCode::Char(c) => {
                    if matches!(onboarding.current_screen, OnboardingScreen::Identity) {
                        onboarding.current_field_value().push(c);
                    }
                }
                KeyCode::Backspace => {
                    if matches!(onboarding.current_screen, OnboardingScreen::Identity) {
                        onboarding.current_field_value().pop();
                    }
                }
                _ => {}
            }
            return Ok(false);
        }

        if key.code == KeyCode::Char('?') {
            self.show_help = !self.show_help;
            return Ok(false);
        }

        if self.show_help {
            if key.code == KeyCode::Esc {
                self.show_help = false;
            }
            return Ok(false);
        }

        if self.show_error_details {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('E') => {
                    self.show_error_details = false;
                }
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.widgets.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => self.connect(self.selected),
            KeyCode::Char('d') => self.mark_authorization_done(self.selected),
            KeyCode::Char('f') => self.fetch_credentials(self.selected),
            KeyCode::Char('l') => self.load_items(self.selected),
            KeyCode::Char('E') => {
                if self.last_error.is_some() {
                    self.show_error_details = true;
                }
            }
            KeyCode::Esc => self.clear_error(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<bool> {
        if self.onboarding.is_some() || self.show_help {
            return Ok(false);
        }

        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if let Some(index) = self.layout.card_at(mouse.column, mouse.row) {
                self.selected = index;
                self.connect(index);
            }
        }
        Ok(false)
    }
}
