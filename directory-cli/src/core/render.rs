use crate::api::models::{Business, ResultPage};

/// Instruction handed to the presentation layer after each fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDirective {
    /// Drop previously shown results before adding `items`
    pub clear: bool,
    pub items: Vec<Business>,
    pub total_label: String,
    pub show_load_more: bool,
    /// First page came back empty; show the "no results" notice
    pub no_results: bool,
}

impl RenderDirective {
    pub fn for_page(page: &ResultPage, clear: bool, show_load_more: bool) -> Self {
        Self {
            clear,
            items: page.items.clone(),
            total_label: total_label(page.total_results, page.current_count),
            show_load_more,
            no_results: clear && page.items.is_empty(),
        }
    }
}

pub fn total_label(total_results: u64, current_count: u64) -> String {
    format!(
        "Found {} results (showing {})",
        total_results, current_count
    )
}

/// Presentation collaborator. Fire-and-forget: the controller never waits on
/// or inspects what the renderer does with a directive.
pub trait ResultRenderer: Send + Sync {
    fn render(&self, directive: RenderDirective);
}
