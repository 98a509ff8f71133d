#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnboardingScreen {
    Welcome,
    Identity,
    Complete,
}

/// First-run form collecting the user and org ids sent with every
/// connect request.
pub struct OnboardingState {
    pub current_screen: OnboardingScreen,
    pub user_id: String,
    pub org_id: String,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingState {
    pub fn new() -> Self {
        Self {
            current_screen: OnboardingScreen::Welcome,
            user_id: String::new(),
            org_id: String::new(),
            selected_field: 0,
            error_message: None,
        }
    }

    pub fn with_identity(user_id: &str, org_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
            ..Self::new()
        }
    }

    pub fn toggle_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % 2;
    }

    pub fn current_field_value(&mut self) -> &mut String {
        if self.selected_field == 0 {
            &mut self.user_id
        } else {
            &mut self.org_id
        }
    }

    pub fn identity_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.org_id.trim().is_empty()
    }

    /// Advances one screen. Leaving the identity form requires both ids.
    pub fn next_screen(&mut self) {
        self.current_screen = match self.current_screen {
            OnboardingScreen::Welcome => OnboardingScreen::Identity,
            OnboardingScreen::Identity if !self.identity_complete() => {
                self.error_message = Some("User ID and Org ID are required".to_string());
                OnboardingScreen::Identity
            }
            OnboardingScreen::Identity => {
                self.error_message = None;
                OnboardingScreen::Complete
            }
            OnboardingScreen::Complete => OnboardingScreen::Complete,
        };
    }

    pub fn previous_screen(&mut self) {
        self.current_screen = match self.current_screen {
            OnboardingScreen::Welcome => OnboardingScreen::Welcome,
            OnboardingScreen::Identity => OnboardingScreen::Welcome,
            OnboardingScreen::Complete => OnboardingScreen::Identity,
        };
    }
}
