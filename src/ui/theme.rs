use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeType::Light),
            "dark" => Ok(ThemeType::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

impl fmt::Display for ThemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeType::Light => f.write_str("light"),
            ThemeType::Dark => f.write_str("dark"),
        }
    }
}

/// What a piece of output text represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Dir,
    File,
    Line,
    Code,
    Connector,
    StatHeader,
    StatValue,
    Error,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, Copy)]
pub struct ColorTheme {
    theme_type: ThemeType,
    enabled: bool,
}

impl ColorTheme {
    pub fn new(theme_type: ThemeType, enabled: bool) -> Self {
        Self { theme_type, enabled }
    }

    pub fn plain() -> Self {
        Self::new(ThemeType::Light, false)
    }

    pub fn theme_type(&self) -> ThemeType {
        self.theme_type
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn styled(&self, role: Role, text: &str) -> ColoredString {
        match (self.theme_type, role) {
            (ThemeType::Light, Role::Dir) => text.cyan().bold(),
            (ThemeType::Light, Role::File) => text.green().bold(),
            (ThemeType::Light, Role::Line) => text.yellow(),
            (ThemeType::Light, Role::Connector) => text.magenta(),
            (ThemeType::Dark, Role::Dir) => text.blue().bold(),
            (ThemeType::Dark, Role::File) => text.white().bold(),
            (ThemeType::Dark, Role::Line) => text.magenta(),
            (ThemeType::Dark, Role::Connector) => text.yellow(),
            (_, Role::Code) => text.white(),
            (_, Role::StatHeader) => text.cyan().bold(),
            (_, Role::StatValue) => text.yellow(),
            (_, Role::Error) => text.red().bold(),
            (_, Role::Warning) => text.yellow(),
            (_, Role::Success) => text.green(),
            (_, Role::Info) => text.normal(),
        }
    }

    /// `text` with the role's colours, or unchanged when colours are off.
    pub fn paint(&self, role: Role, text: &str) -> String {
        if self.enabled {
            self.styled(role, text).to_string()
        } else {
            text.to_string()
        }
    }
}
