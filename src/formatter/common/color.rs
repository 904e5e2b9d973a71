use std::io::{self, IsTerminal};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, clap::ValueEnum)]
pub enum ColorSetting {
    #[default]
    Automatic,
    Always,
    Never,
}

pub(crate) mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Whether a write target is a terminal that understands ANSI colors.
pub trait SupportsColor {
    fn supports_color(&self) -> bool;
}

impl SupportsColor for io::Stdout {
    fn supports_color(&self) -> bool {
        self.is_terminal()
    }
}

impl SupportsColor for io::Stderr {
    fn supports_color(&self) -> bool {
        self.is_terminal()
    }
}

impl SupportsColor for Vec<u8> {
    fn supports_color(&self) -> bool {
        false
    }
}

impl<W: SupportsColor + ?Sized> SupportsColor for &mut W {
    fn supports_color(&self) -> bool {
        (**self).supports_color()
    }
}

impl ColorSetting {
    pub fn use_color(self, target: &impl SupportsColor) -> bool {
        match self {
            ColorSetting::Automatic => target.supports_color(),
            ColorSetting::Always => true,
            ColorSetting::Never => false,
        }
    }
}

/// Wrap `text` into `color` when `enabled`.
pub(crate) fn paint(enabled: bool, color: &str, text: &str) -> String {
    match enabled {
        true => format!("{color}{text}{}", colors::RESET),
        false => text.to_string(),
    }
}
