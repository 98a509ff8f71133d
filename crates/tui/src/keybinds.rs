pub struct Keybinds;

impl Default for Keybinds {
    fn default() -> Self {
        Self
    }
}

impl Keybinds {
    pub fn help_text(&self) -> String {
        r#"Keyboard Shortcuts:

Integrations:
  ↑ / ↓  or  k / j   Select integration
  Enter  or  c       Connect selected integration
  d                  Done authorizing in the browser
  f                  Fetch credentials
  l                  Load integration items

General:
  ?             Toggle this help
  Shift + E     Show latest error details
  Ctrl + Q      Quit

Mouse:
  Click         Select and connect an integration
"#
        .to_string()
    }
}
