use chrono::{DateTime, Utc};
use colored::Colorize;
use shelf::model::Entity;
use shelf::schedule::BackupReport;
use shelf::store::{Page, Pagination};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const KEY_WIDTH: usize = 38;
const TIME_WIDTH: usize = 16;

pub fn print_page<E: Entity>(page: &Page<E>, pagination: Pagination) {
    if page.items.is_empty() {
        println!("No {} found.", E::KIND.replace('_', " "));
        return;
    }

    for (i, item) in page.items.iter().enumerate() {
        let position = format!("{:>3}. ", pagination.skip() + i + 1);
        let key = truncate_to_width(item.key(), KEY_WIDTH);
        let key_cell = format!("{}{}", key, " ".repeat(KEY_WIDTH.saturating_sub(key.width())));

        let fixed = position.width() + KEY_WIDTH + 2 + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed);
        // Entities keyed by id show their display name in the wide column.
        let name = if item.name() == item.key() {
            String::new()
        } else {
            truncate_to_width(item.name(), available)
        };
        let padding = available.saturating_sub(name.width());

        println!(
            "{}{}  {}{}{}",
            position.normal(),
            key_cell.yellow(),
            name,
            " ".repeat(padding),
            format_time_ago(item.added_at()).dimmed()
        );
    }

    if page.more_pages {
        println!(
            "{}",
            format!("More results: --page {}", pagination.page() + 1).dimmed()
        );
    }
}

pub fn print_entity<E: Entity>(entity: &E) {
    match serde_json::to_string_pretty(&entity.to_json()) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{:?}", entity),
    }
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_backup_report(report: &BackupReport) {
    for name in &report.succeeded {
        println!("{} {}", "backed up".green(), name);
    }
    for name in &report.failed {
        println!("{} {}", "failed   ".red(), name);
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let c = if c == '\n' { ' ' } else { c };
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_strings_are_untouched() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
    }

    #[test]
    fn test_long_strings_end_in_an_ellipsis() {
        let cut = truncate_to_width("abcdefghij", 5);
        assert_eq!(cut, "abcd…");
        assert_eq!(cut.width(), 5);
    }

    #[test]
    fn test_wide_characters_count_double() {
        let cut = truncate_to_width("日本語のテキスト", 7);
        assert!(cut.width() <= 7);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_time_ago_is_right_aligned() {
        let formatted = format_time_ago(Utc::now() - chrono::Duration::hours(2));
        assert_eq!(formatted.len(), TIME_WIDTH);
        assert_eq!(formatted.trim(), "2 hours ago");
    }
}
