use ratatui::style::{Color, Modifier, Style};

// ── Palette ────────────────────────────────────────────────────────
pub const ASH_TEXT: Color = Color::Rgb(90, 90, 80);
pub const CHALK_DIM: Color = Color::Rgb(122, 122, 112);
pub const CHALK: Color = Color::Rgb(232, 228, 208);
pub const SODIUM: Color = Color::Rgb(232, 163, 60);
pub const FORM_RAISED: Color = Color::Rgb(20, 20, 18);

pub const PROMPT_CHAR: &str = "❯";
pub const SELECTED_MARK: &str = "▸ ";

/// Sodium bold prompt character before the filter text
pub fn prompt() -> Style {
    Style::default().fg(SODIUM).add_modifier(Modifier::BOLD)
}

/// Filter text the user has typed
pub fn filter() -> Style {
    Style::default().fg(CHALK)
}

/// Unselected app name
pub fn item() -> Style {
    Style::default().fg(CHALK_DIM)
}

/// Highlighted app name
pub fn selected() -> Style {
    Style::default()
        .fg(SODIUM)
        .bg(FORM_RAISED)
        .add_modifier(Modifier::BOLD)
}

/// Key hints on the bottom line
pub fn hint() -> Style {
    Style::default().fg(ASH_TEXT)
}
