use ratatui::style::{Color, Modifier, Style};

use davomat::config::ColorOverrides;

/// Colors used across the timetable, attendance and form views
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    /// Accent color (header, focused borders)
    pub primary: String,

    /// Present marks, success messages
    pub success: String,

    /// Selection, info messages
    pub warning: String,

    /// Absent marks, errors
    pub error: String,

    pub text_muted: String,

    /// Placeholders and empty states
    pub text_disabled: String,

    pub border_normal: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            primary: "Cyan".to_string(),
            success: "Green".to_string(),
            warning: "Yellow".to_string(),
            error: "Red".to_string(),
            text_muted: "Gray".to_string(),
            text_disabled: "DarkGray".to_string(),
            border_normal: "DarkGray".to_string(),
        }
    }
}

impl Theme {
    /// Parse a color name, `#rrggbb` or a 256-color index
    pub fn parse_color(color_str: &str) -> Color {
        match color_str.trim() {
            "Black" => Color::Black,
            "Red" => Color::Red,
            "Green" => Color::Green,
            "Yellow" => Color::Yellow,
            "Blue" => Color::Blue,
            "Magenta" => Color::Magenta,
            "Cyan" => Color::Cyan,
            "Gray" | "Grey" => Color::Gray,
            "DarkGray" | "DarkGrey" => Color::DarkGray,
            "White" => Color::White,
            s if s.starts_with('#') => parse_hex_color(s)
                .map(|(r, g, b)| Color::Rgb(r, g, b))
                .unwrap_or(Color::Reset),
            s => s.parse::<u8>().map(Color::Indexed).unwrap_or(Color::Reset),
        }
    }

    pub fn primary(&self) -> Color {
        Self::parse_color(&self.primary)
    }

    pub fn success(&self) -> Color {
        Self::parse_color(&self.success)
    }

    pub fn warning(&self) -> Color {
        Self::parse_color(&self.warning)
    }

    pub fn error(&self) -> Color {
        Self::parse_color(&self.error)
    }

    pub fn text_muted(&self) -> Color {
        Self::parse_color(&self.text_muted)
    }

    pub fn text_disabled(&self) -> Color {
        Self::parse_color(&self.text_disabled)
    }

    pub fn border_normal(&self) -> Color {
        Self::parse_color(&self.border_normal)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.warning())
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.primary())
        } else {
            Style::default().fg(self.border_normal())
        }
    }

    /// Roster row color for a present / absent mark
    pub fn mark_style(&self, came: bool) -> Style {
        if came {
            Style::default().fg(self.success())
        } else {
            Style::default().fg(self.error())
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            primary: "#88c0d0".to_string(),
            success: "#a3be8c".to_string(),
            warning: "#ebcb8b".to_string(),
            error: "#bf616a".to_string(),
            text_muted: "#d8dee9".to_string(),
            text_disabled: "#4c566a".to_string(),
            border_normal: "#3b4252".to_string(),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            primary: "#8be9fd".to_string(),
            success: "#50fa7b".to_string(),
            warning: "#f1fa8c".to_string(),
            error: "#ff5555".to_string(),
            text_muted: "#6272a4".to_string(),
            text_disabled: "#44475a".to_string(),
            border_normal: "#44475a".to_string(),
        }
    }

    /// Replace preset colors with the ones set in `[ui.colors]`.
    pub fn with_overrides(mut self, colors: &ColorOverrides) -> Self {
        let slots = [
            (&mut self.primary, &colors.primary),
            (&mut self.success, &colors.success),
            (&mut self.warning, &colors.warning),
            (&mut self.error, &colors.error),
            (&mut self.text_muted, &colors.text_muted),
            (&mut self.text_disabled, &colors.text_disabled),
            (&mut self.border_normal, &colors.border_normal),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        self
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "nord" => Some(Self::nord()),
            "dracula" => Some(Self::dracula()),
            _ => None,
        }
    }
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!(Theme::parse_color("Cyan"), Color::Cyan);
        assert_eq!(Theme::parse_color("#ff0000"), Color::Rgb(255, 0, 0));
        assert_eq!(Theme::parse_color("42"), Color::Indexed(42));
        assert_eq!(Theme::parse_color("#abc"), Color::Reset);
        assert_eq!(Theme::parse_color("chartreuse"), Color::Reset);
    }

    #[test]
    fn test_theme_presets() {
        assert_eq!(Theme::from_preset("Nord").map(|t| t.name), Some("nord".to_string()));
        assert!(Theme::from_preset("dracula").is_some());
        assert!(Theme::from_preset("solarized").is_none());
    }

    #[test]
    fn test_config_overrides_reach_color_parsing() {
        let colors = ColorOverrides {
            primary: Some("#ff8800".to_string()),
            border_normal: Some("240".to_string()),
            ..Default::default()
        };
        let theme = Theme::nord().with_overrides(&colors);

        assert_eq!(theme.primary(), Color::Rgb(255, 136, 0));
        assert_eq!(theme.border_normal(), Color::Indexed(240));
        assert_eq!(theme.success(), Color::Rgb(0xa3, 0xbe, 0x8c));
        assert_eq!(theme.name, "nord");
    }

    #[test]
    fn test_mark_style_follows_presence() {
        let theme = Theme::default();
        assert_eq!(theme.mark_style(true).fg, Some(Color::Green));
        assert_eq!(theme.mark_style(false).fg, Some(Color::Red));
    }
}
