use regex::Regex;
use std::sync::OnceLock;

fn token_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"("(?:access_token|refresh_token|id_token|client_secret)"\s*:\s*")[^"]*(")"#)
            .expect("valid token field pattern")
    })
}

fn bearer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(Bearer\s+)\S+").expect("valid bearer pattern"))
}

/// Masks token values before text reaches a log line or the screen.
pub fn redact_sensitive(input: &str) -> String {
    let masked = token_field().replace_all(input, "${1}[REDACTED]${2}");
    bearer().replace_all(&masked, "${1}[REDACTED]").into_owned()
}
