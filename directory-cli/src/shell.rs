use anyhow::Result;
use crossterm::style::Stylize;
use parking_lot::Mutex;
use reedline::{
    default_emacs_keybindings, ColumnarMenu, Emacs, FileBackedHistory, KeyCode, KeyModifiers,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::completer::DirectoryCompleter;
use directory_cli::api::ApiClient;
use directory_cli::config::Config;
use directory_cli::data_exporter::export_to_csv;
use directory_cli::services::FilterOptions;
use directory_cli::table_display::TableRenderer;
use directory_cli::utils::app_paths::AppPaths;
use directory_cli::utils::logging::{get_log_buffer, log_file_path};
use directory_cli::{FetchOutcome, SearchController, SearchQuery};

const DEFAULT_LOG_LINES: usize = 20;

/// One line typed at the shell prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search { category: String, location: String },
    More,
    Status,
    Categories,
    Locations,
    Export(PathBuf),
    Logs(usize),
    Clear,
    Help,
    Quit,
    Invalid(String),
    Empty,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }

        if let Some(command) = line.strip_prefix('\\') {
            let (name, arg) = match command.split_once(char::is_whitespace) {
                Some((name, arg)) => (name, arg.trim()),
                None => (command, ""),
            };
            return match name {
                "more" | "m" => ShellCommand::More,
                "status" => ShellCommand::Status,
                "categories" => ShellCommand::Categories,
                "locations" => ShellCommand::Locations,
                "export" if arg.is_empty() => {
                    ShellCommand::Invalid("Usage: \\export <filename.csv>".to_string())
                }
                "export" => ShellCommand::Export(PathBuf::from(arg)),
                "logs" if arg.is_empty() => ShellCommand::Logs(DEFAULT_LOG_LINES),
                "logs" => match arg.parse() {
                    Ok(n) => ShellCommand::Logs(n),
                    Err(_) => ShellCommand::Invalid("Usage: \\logs [count]".to_string()),
                },
                "clear" => ShellCommand::Clear,
                "help" | "?" => ShellCommand::Help,
                "quit" | "q" | "exit" => ShellCommand::Quit,
                other => ShellCommand::Invalid(format!("Unknown command: \\{}", other)),
            };
        }

        match line.split_once('@') {
            Some((category, location)) => ShellCommand::Search {
                category: category.trim().to_string(),
                location: location.trim().to_string(),
            },
            None => ShellCommand::Invalid(
                "Search with: <category> @ <location>  (\\help for commands)".to_string(),
            ),
        }
    }
}

struct DirectoryPrompt;

impl Prompt for DirectoryPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed("directory")
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => "> ".into(),
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                reedline::PromptViMode::Normal => "N> ".into(),
                reedline::PromptViMode::Insert => "I> ".into(),
            },
            PromptEditMode::Custom(str) => format!("{str}> ").into(),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse search: {})",
            prefix, history_search.term
        ))
    }
}

pub fn print_help() {
    println!("{}", "Directory CLI - local business search".blue().bold());
    println!();
    println!("{}", "Search:".yellow());
    println!("  {}   - Start a new search", "<category> @ <location>".green());
    println!("  {}                    - Load the next page", "\\more".green());
    println!();
    println!("{}", "Commands:".yellow());
    println!("  {}              - Show the active search", "\\status".green());
    println!("  {}          - List service categories", "\\categories".green());
    println!("  {}           - List locations", "\\locations".green());
    println!("  {} - Export shown results to CSV", "\\export <file.csv>".green());
    println!("  {}            - Show recent log lines", "\\logs [n]".green());
    println!("  {}               - Clear screen", "\\clear".green());
    println!("  {}                - Show this help", "\\help".green());
    println!("  {}        - Exit", "\\quit or Ctrl+D".green());
    println!();
    println!("{}", "Tab completes commands, categories and locations.".dark_grey());
    println!();
}

fn print_list(title: &str, values: &[String]) {
    if values.is_empty() {
        println!("{}", format!("No {} available", title).yellow());
        return;
    }
    println!("{}", title.yellow().bold());
    for value in values {
        println!("  {}", value);
    }
}

/// Interactive search session over the directory backend
pub struct Shell {
    controller: SearchController<ApiClient, TableRenderer>,
    client: ApiClient,
    filters: Arc<Mutex<FilterOptions>>,
    config: Config,
}

impl Shell {
    pub fn new(client: ApiClient, config: Config) -> Self {
        let renderer =
            TableRenderer::new(config.display.use_glyphs, config.display.show_row_numbers);
        Self {
            controller: SearchController::new(client.clone(), renderer),
            client,
            filters: Arc::new(Mutex::new(FilterOptions::default())),
            config,
        }
    }

    fn refresh_filters(&self, runtime: &Runtime) {
        let (options, errors) = runtime.block_on(FilterOptions::load(&self.client));
        for error in errors {
            eprintln!("{}", format!("Error loading filters: {}", error).red());
        }
        *self.filters.lock() = options;
    }

    /// Map typed names onto the backend's spelling when the lists are loaded
    fn resolve_query(&self, category: &str, location: &str) -> SearchQuery {
        let filters = self.filters.lock();
        let category = filters
            .resolve_category(category)
            .map(str::to_string)
            .unwrap_or_else(|| category.to_string());
        let location = filters
            .resolve_location(location)
            .map(str::to_string)
            .unwrap_or_else(|| location.to_string());
        SearchQuery::new(category, location)
    }

    fn report(&self, result: Result<FetchOutcome, directory_cli::SearchError>) {
        match result {
            Ok(FetchOutcome::Page(_)) => {}
            Ok(FetchOutcome::NothingToLoad) => {
                println!("{}", "No more results to load.".yellow())
            }
            Ok(FetchOutcome::Busy) => {
                println!("{}", "A search is still running.".yellow())
            }
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
    }

    fn print_status(&self) {
        let session = self.controller.session();
        match &session.query {
            Some(query) => {
                println!(
                    "{} @ {}: showing {} results{}",
                    query.category.as_str().cyan(),
                    query.location.as_str().cyan(),
                    session.result_count,
                    if session.has_more {
                        ", more available"
                    } else {
                        ""
                    }
                );
            }
            None => println!("{}", "No active search.".yellow()),
        }
    }

    fn print_logs(&self, count: usize) {
        match get_log_buffer() {
            Some(buffer) if !buffer.is_empty() => {
                for entry in buffer.get_recent(count) {
                    println!("{}", entry.format_for_display().dark_grey());
                }
            }
            _ => println!("{}", "No log entries.".yellow()),
        }
        if let Some(path) = log_file_path() {
            println!("{}", format!("Full log: {}", path.display()).dark_grey());
        }
    }

    /// Run one command; returns false when the shell should exit
    pub fn execute(&self, runtime: &Runtime, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Search { category, location } => {
                let query = self.resolve_query(&category, &location);
                println!(
                    "{}",
                    format!("Searching {} in {}...", query.category, query.location).cyan()
                );
                let result = runtime.block_on(self.controller.start_search(query));
                self.report(result);
            }
            ShellCommand::More => {
                let result = runtime.block_on(self.controller.load_more());
                self.report(result);
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Categories => {
                self.refresh_filters(runtime);
                print_list("Categories", &self.filters.lock().categories);
            }
            ShellCommand::Locations => {
                self.refresh_filters(runtime);
                print_list("Locations", &self.filters.lock().locations);
            }
            ShellCommand::Export(path) => {
                match export_to_csv(&self.controller.renderer().displayed(), &path) {
                    Ok(rows) => println!(
                        "{}",
                        format!("Exported {} rows to {}", rows, path.display()).green()
                    ),
                    Err(e) => eprintln!("{}", format!("Export error: {:#}", e).red()),
                }
            }
            ShellCommand::Logs(count) => self.print_logs(count),
            ShellCommand::Clear => print!("{esc}[2J{esc}[1;1H", esc = 27 as char),
            ShellCommand::Help => print_help(),
            ShellCommand::Invalid(message) => eprintln!("{}", message.red()),
            ShellCommand::Quit => return false,
        }
        true
    }

    pub fn run(&self, runtime: &Runtime) -> Result<()> {
        print_help();
        println!(
            "{}",
            format!("Connected to API: {}", self.client.base_url()).cyan()
        );

        if self.config.behavior.load_filters_on_start {
            self.refresh_filters(runtime);
        }

        let mut line_editor = self.build_editor();
        let prompt = DirectoryPrompt;

        loop {
            let sig = line_editor.read_line(&prompt)?;
            match sig {
                Signal::Success(buffer) => {
                    if !self.execute(runtime, ShellCommand::parse(&buffer)) {
                        break;
                    }
                }
                Signal::CtrlD | Signal::CtrlC => break,
            }
        }

        info!(target: "shell", "Shell closed");
        println!("\nGoodbye!");
        Ok(())
    }

    fn build_editor(&self) -> Reedline {
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("directory_completion")
                .with_columns(1)
                .with_column_width(None)
                .with_column_padding(2),
        );

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::Menu("directory_completion".to_string()),
        );

        let mut editor = Reedline::create()
            .with_completer(Box::new(DirectoryCompleter::new(self.filters.clone())))
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        if self.config.behavior.enable_history {
            let history = AppPaths::history_file().and_then(|path| {
                FileBackedHistory::with_file(self.config.behavior.max_history_entries, path)
                    .map_err(|e| anyhow::anyhow!("{}", e))
            });
            match history {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!(target: "shell", "History disabled: {}", e),
            }
        }

        editor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_line_splits_on_at_sign() {
        assert_eq!(
            ShellCommand::parse("  HVAC Repair @ Austin, TX "),
            ShellCommand::Search {
                category: "HVAC Repair".into(),
                location: "Austin, TX".into()
            }
        );
    }

    #[test]
    fn blank_side_of_search_still_parses() {
        // rejected later by the controller's validation
        assert_eq!(
            ShellCommand::parse("Plumbing @"),
            ShellCommand::Search {
                category: "Plumbing".into(),
                location: "".into()
            }
        );
    }

    #[test]
    fn backslash_commands() {
        assert_eq!(ShellCommand::parse("\\more"), ShellCommand::More);
        assert_eq!(ShellCommand::parse("\\logs 5"), ShellCommand::Logs(5));
        assert_eq!(
            ShellCommand::parse("\\logs"),
            ShellCommand::Logs(DEFAULT_LOG_LINES)
        );
        assert_eq!(
            ShellCommand::parse("\\export out.csv"),
            ShellCommand::Export(PathBuf::from("out.csv"))
        );
        assert!(matches!(
            ShellCommand::parse("\\export"),
            ShellCommand::Invalid(_)
        ));
        assert!(matches!(
            ShellCommand::parse("\\frobnicate"),
            ShellCommand::Invalid(_)
        ));
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
    }

    #[test]
    fn plain_text_without_location_is_rejected() {
        assert!(matches!(
            ShellCommand::parse("Plumbing"),
            ShellCommand::Invalid(_)
        ));
    }
}
