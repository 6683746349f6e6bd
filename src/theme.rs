//! Color themes, selectable with `--theme` / `THEME`.

use ratatui::style::Color;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Muted colors on the terminal's own background
    #[default]
    Default,
    /// Amber CRT
    Amber,
    /// No colors beyond bold/reverse, for limited terminals
    Mono,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Default => Palette::default_dark(),
            Theme::Amber => Palette::amber(),
            Theme::Mono => Palette::mono(),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "default" | "dark" => Ok(Theme::Default),
            "amber" | "amber-crt" => Ok(Theme::Amber),
            "mono" | "plain" => Ok(Theme::Mono),
            _ => Err(anyhow::anyhow!(
                "Unknown theme '{s}'. Available: default, amber, mono"
            )),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Default => write!(f, "default"),
            Theme::Amber => write!(f, "amber"),
            Theme::Mono => write!(f, "mono"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub text_dim: Color,
    /// Focused pane border and key hints
    pub accent: Color,
    pub border: Color,
    pub focused_bg: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Hashes and addresses
    pub hash: Color,
    /// Amounts
    pub amount: Color,
    pub ok: Color,
    pub error: Color,
    pub debug: Color,
}

impl Palette {
    pub fn default_dark() -> Self {
        Self {
            text: Color::White,
            text_dim: Color::Gray,
            accent: Color::Yellow,
            border: Color::DarkGray,
            focused_bg: Color::Rgb(40, 40, 40),
            selection_bg: Color::Yellow,
            selection_fg: Color::Black,
            hash: Color::Cyan,
            amount: Color::LightGreen,
            ok: Color::Green,
            error: Color::Red,
            debug: Color::Magenta,
        }
    }

    pub fn amber() -> Self {
        let amber = Color::Rgb(255, 176, 0);
        let bright = Color::Rgb(255, 200, 100);
        let dim = Color::Rgb(180, 120, 0);
        Self {
            text: amber,
            text_dim: dim,
            accent: bright,
            border: dim,
            focused_bg: Color::Rgb(30, 20, 0),
            selection_bg: amber,
            selection_fg: Color::Black,
            hash: bright,
            amount: bright,
            ok: Color::Rgb(100, 255, 100),
            error: Color::Red,
            debug: Color::Rgb(255, 100, 255),
        }
    }

    pub fn mono() -> Self {
        Self {
            text: Color::Reset,
            text_dim: Color::Reset,
            accent: Color::Reset,
            border: Color::Reset,
            focused_bg: Color::Reset,
            selection_bg: Color::Reset,
            selection_fg: Color::Reset,
            hash: Color::Reset,
            amount: Color::Reset,
            ok: Color::Reset,
            error: Color::Reset,
            debug: Color::Reset,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_names_parse() {
        assert_eq!("default".parse::<Theme>().unwrap(), Theme::Default);
        assert_eq!("AMBER".parse::<Theme>().unwrap(), Theme::Amber);
        assert_eq!("plain".parse::<Theme>().unwrap(), Theme::Mono);
        assert!("solarized".parse::<Theme>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for theme in [Theme::Default, Theme::Amber, Theme::Mono] {
            assert_eq!(theme.to_string().parse::<Theme>().unwrap(), theme);
        }
    }
}
