use serde::Serialize;

/// Icon shown in front of a block row
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    /// The lookup failed
    Flagged,
    /// Section has unread alerts
    Unread,
    /// Section has nothing unread
    Read,
    /// Nothing to list
    Info,
}

impl IconKind {
    /// Host pixmap identifier
    pub fn pix(&self) -> &'static str {
        match self {
            IconKind::Flagged => "i/flagged",
            IconKind::Unread => "i/unread",
            IconKind::Read => "i/completion-auto-y",
            IconKind::Info => "i/publish",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub label: String,
    pub href: Option<String>,
    pub icon: IconKind,
    /// Open `href` in a new browsing context
    pub new_window: bool,
}

impl DisplayRow {
    pub fn text(label: impl Into<String>, icon: IconKind) -> Self {
        Self {
            label: label.into(),
            href: None,
            icon,
            new_window: false,
        }
    }

    pub fn link(label: impl Into<String>, href: impl Into<String>, icon: IconKind) -> Self {
        Self {
            label: label.into(),
            href: Some(href.into()),
            icon,
            new_window: false,
        }
    }

    pub fn in_new_window(mut self) -> Self {
        self.new_window = true;
        self
    }
}

/// Final block content: rows in display order plus a footer line
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayModel {
    pub rows: Vec<DisplayRow>,
    pub footer: String,
}

impl DisplayModel {
    /// What an unauthorized viewer gets
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.footer.is_empty()
    }
}
