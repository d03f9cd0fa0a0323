// src/core/icons.rs

use std::fmt;

/// The icon names a column can carry. Unknown names map to `IconKind::Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconKind {
    Activity,
    BarChart,
    Book,
    Bug,
    Cloud,
    Code,
    Database,
    FileText,
    GitBranch,
    Globe,
    Key,
    Lock,
    Server,
    Settings,
    Shield,
    Terminal,
    #[default]
    Default,
}

impl IconKind {
    /// Parses an icon name. Matching is case-insensitive and ignores `-`/`_` separators.
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "activity" | "monitoring" => IconKind::Activity,
            "barchart" | "chart" | "metrics" => IconKind::BarChart,
            "book" | "docs" | "wiki" => IconKind::Book,
            "bug" | "errors" => IconKind::Bug,
            "cloud" => IconKind::Cloud,
            "code" | "repo" => IconKind::Code,
            "database" | "db" => IconKind::Database,
            "filetext" | "logs" => IconKind::FileText,
            "gitbranch" | "git" => IconKind::GitBranch,
            "globe" | "web" => IconKind::Globe,
            "key" => IconKind::Key,
            "lock" => IconKind::Lock,
            "server" => IconKind::Server,
            "settings" | "cog" => IconKind::Settings,
            "shield" | "security" => IconKind::Shield,
            "terminal" | "console" => IconKind::Terminal,
            _ => IconKind::Default,
        }
    }

    /// The terminal glyph for this icon.
    pub fn glyph(&self) -> &'static str {
        match self {
            IconKind::Activity => "📈",
            IconKind::BarChart => "📊",
            IconKind::Book => "📖",
            IconKind::Bug => "🐛",
            IconKind::Cloud => "☁️",
            IconKind::Code => "🧩",
            IconKind::Database => "🗄️",
            IconKind::FileText => "📄",
            IconKind::GitBranch => "🌿",
            IconKind::Globe => "🌐",
            IconKind::Key => "🔑",
            IconKind::Lock => "🔒",
            IconKind::Server => "🖥️",
            IconKind::Settings => "⚙️",
            IconKind::Shield => "🛡️",
            IconKind::Terminal => "💻",
            IconKind::Default => "🔗",
        }
    }
}

impl fmt::Display for IconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Glyph for an optional icon name, falling back to the default icon.
pub fn glyph_for(name: Option<&str>) -> &'static str {
    name.map(IconKind::from_name).unwrap_or_default().glyph()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_and_aliases() {
        assert_eq!(IconKind::from_name("file-text"), IconKind::FileText);
        assert_eq!(IconKind::from_name("FILE_TEXT"), IconKind::FileText);
        assert_eq!(IconKind::from_name("Git-Branch"), IconKind::GitBranch);
        assert_eq!(IconKind::from_name("db"), IconKind::Database);
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(IconKind::from_name("sparkles"), IconKind::Default);
        assert_eq!(glyph_for(None), IconKind::Default.glyph());
        assert_eq!(glyph_for(Some("terminal")), "💻");
    }
}
