use reqwest::Url;

use crate::types::{AlertResult, DisplayModel, DisplayRow, IconKind};

/// Label of the row shown when the retention system lists nothing.
pub const NO_ALERTS_LABEL: &str = "No retention alerts to display";

/// Footer for the data branch; ends with the number of listed sections
pub fn footer(user_name: &str, count: usize) -> String {
    format!(
        "Displaying Unread RMS Alerts counts for {}: {}",
        user_name, count
    )
}

/// Only absolute http(s) URLs from the remote side become links
fn is_safe_link(href: &str) -> bool {
    Url::parse(href)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Map a lookup outcome onto block rows.
///
/// The error branch yields a single unlinked row and no footer. The data
/// branch yields one row per section, or one fallback row to `home_url` when
/// there are none.
pub fn present(result: &AlertResult, user_name: &str, home_url: &str) -> DisplayModel {
    if result.is_error() {
        return DisplayModel {
            rows: vec![DisplayRow::text(&result.error_message, IconKind::Flagged)],
            footer: String::new(),
        };
    }

    let mut rows: Vec<DisplayRow> = result
        .sections
        .iter()
        .map(|section| {
            let icon = if section.has_unread() {
                IconKind::Unread
            } else {
                IconKind::Read
            };
            if is_safe_link(&section.url) {
                DisplayRow::link(section.label(), &section.url, icon).in_new_window()
            } else {
                log::warn!("Not linking '{}': unsupported URL", section.short_name);
                DisplayRow::text(section.label(), icon)
            }
        })
        .collect();

    let count = rows.len();
    if rows.is_empty() {
        rows.push(DisplayRow::link(NO_ALERTS_LABEL, home_url, IconKind::Info));
    }

    DisplayModel {
        rows,
        footer: footer(user_name, count),
    }
}
