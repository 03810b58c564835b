//! Small builders for markdown lines composed by the journal.

pub fn build_heading(level: u8, text: &str) -> String {
    format!("{} {}", "#".repeat(usize::from(level)), text)
}

pub fn build_link(text: &str, destination: &str) -> String {
    format!("[{}]({})", text, destination)
}

pub fn build_list(text: &str) -> String {
    format!("- {}", text)
}

pub fn build_ordered_list(number: usize, text: &str) -> String {
    format!("{}. {}", number, text)
}

/// Task list item, `- [x] text` when checked.
pub fn build_checkbox(text: &str, checked: bool) -> String {
    let mark = if checked { 'x' } else { ' ' };
    format!("- [{}] {}", mark, text)
}
