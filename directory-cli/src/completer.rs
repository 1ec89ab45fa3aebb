use parking_lot::Mutex;
use reedline::{Completer, Span, Suggestion};
use std::sync::Arc;

use directory_cli::services::FilterOptions;

pub const SHELL_COMMANDS: [&str; 9] = [
    "\\more",
    "\\status",
    "\\categories",
    "\\locations",
    "\\export",
    "\\logs",
    "\\clear",
    "\\help",
    "\\quit",
];

/// Completes shell commands, then categories before `@` and locations after it
pub struct DirectoryCompleter {
    filters: Arc<Mutex<FilterOptions>>,
}

impl DirectoryCompleter {
    pub fn new(filters: Arc<Mutex<FilterOptions>>) -> Self {
        Self { filters }
    }
}

fn suggestion(value: &str, description: &str, start: usize, end: usize) -> Suggestion {
    Suggestion {
        value: value.to_string(),
        description: Some(description.to_string()),
        extra: None,
        span: Span { start, end },
        style: None,
        append_whitespace: false,
    }
}

impl Completer for DirectoryCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let trimmed = input.trim_start();
        let lead = input.len() - trimmed.len();

        if trimmed.starts_with('\\') {
            if trimmed.contains(' ') {
                return Vec::new();
            }
            return SHELL_COMMANDS
                .iter()
                .filter(|c| c.starts_with(trimmed))
                .map(|c| suggestion(c, "command", lead, pos))
                .collect();
        }

        let filters = self.filters.lock();
        match trimmed.split_once('@') {
            Some((_, partial)) => {
                let partial_trimmed = partial.trim_start();
                let start = pos - partial_trimmed.len();
                filters
                    .suggest_locations(partial_trimmed)
                    .into_iter()
                    .map(|l| suggestion(l, "location", start, pos))
                    .collect()
            }
            None => filters
                .suggest_categories(trimmed)
                .into_iter()
                .map(|c| suggestion(&format!("{} @ ", c), "category", lead, pos))
                .collect(),
        }
    }
}
