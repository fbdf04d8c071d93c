use chrono::{DateTime, Utc};
use colored::Colorize;
use engpad::api::{CmdMessage, ListedDocument, MessageLevel};
use engpad::config::NotepadConfig;
use engpad::events::Notice;
use engpad::model::Settings;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const KIND_WIDTH: usize = 16;
const DIRTY_MARKER: &str = "●";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// Notices come from background saves and go to stderr.
pub(super) fn print_notice(notice: &Notice) {
    match notice.level {
        MessageLevel::Error => eprintln!("{}", notice.content.red()),
        MessageLevel::Warning => eprintln!("{}", notice.content.yellow()),
        _ => eprintln!("{}", notice.content.dimmed()),
    }
}

pub(super) fn print_full_documents(docs: &[ListedDocument]) {
    for (i, listed) in docs.iter().enumerate() {
        if i > 0 {
            println!("\n================================\n");
        }
        let doc = &listed.document;
        let id = doc.id.map(|id| format!("#{}", id)).unwrap_or_default();
        println!("{} {} {}", id.yellow(), doc.title.bold(), doc.kind.to_string().dimmed());
        if !doc.tags.is_empty() {
            println!("{}", doc.tags.join(", ").cyan());
        }
        println!("--------------------------------");
        println!("{}", doc.content);
    }
}

pub(super) fn print_documents(docs: &[ListedDocument]) {
    if docs.is_empty() {
        println!("No documents found.");
        return;
    }

    for listed in docs {
        let doc = &listed.document;
        let id_str = doc.id.map(|id| format!("{}. ", id)).unwrap_or_default();
        let dirty = listed.state.map(|s| s.is_dirty).unwrap_or(false);
        let marker = if dirty {
            format!("{} ", DIRTY_MARKER)
        } else {
            "  ".to_string()
        };
        let kind = format!("{:<width$}", doc.kind.to_string(), width = KIND_WIDTH);

        let content_preview: String = doc
            .content
            .chars()
            .take(50)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        let title_content = if content_preview.is_empty() {
            doc.title.clone()
        } else {
            format!("{} {}", doc.title, content_preview)
        };

        let fixed_width = marker.width() + id_str.width() + KIND_WIDTH + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title_display = truncate_to_width(&title_content, available);
        let padding = available.saturating_sub(title_display.width());

        println!(
            "{}{}{}{}{}{}",
            marker.yellow(),
            id_str,
            kind.dimmed(),
            title_display,
            " ".repeat(padding),
            format_time_ago(doc.updated_at).dimmed()
        );
    }
}

pub(super) fn print_config(config: &NotepadConfig) {
    for key in NotepadConfig::KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

pub(super) fn print_settings(settings: &Settings) {
    for key in Settings::KEYS {
        if let Some(value) = settings.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

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
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
    }

    #[test]
    fn long_text_gets_an_ellipsis() {
        let out = truncate_to_width("abcdefghij", 5);
        assert_eq!(out, "abcd…");
        assert_eq!(out.width(), 5);
    }

    #[test]
    fn wide_characters_count_double() {
        let out = truncate_to_width("日本語テキスト", 7);
        assert!(out.width() <= 7);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn time_ago_is_right_aligned() {
        let out = format_time_ago(Utc::now() - chrono::Duration::minutes(5));
        assert_eq!(out.chars().count(), TIME_WIDTH);
        assert!(out.starts_with(' '));
        assert!(out.ends_with("ago"));
    }
}
