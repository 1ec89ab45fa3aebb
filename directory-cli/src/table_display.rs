use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use parking_lot::Mutex;

use crate::api::models::Business;
use crate::core::render::{RenderDirective, ResultRenderer};

const MAX_STARS: usize = 5;

/// Star rating the way the directory cards show it: whole stars, one half
/// star for a fraction of .5 or more, then empty stars up to five
pub fn rating_stars(rating: f64, use_glyphs: bool) -> String {
    let rating = rating.clamp(0.0, MAX_STARS as f64);
    let full = rating.floor() as usize;
    let half = usize::from(rating.fract() >= 0.5);
    let empty = MAX_STARS - full - half;

    let (f, h, e) = if use_glyphs {
        ("★", "⯪", "☆")
    } else {
        ("*", "+", ".")
    };
    format!("{}{}{}", f.repeat(full), h.repeat(half), e.repeat(empty))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Renders result pages as a table of business cards and remembers what is
/// currently on screen
pub struct TableRenderer {
    use_glyphs: bool,
    show_row_numbers: bool,
    displayed: Mutex<Vec<Business>>,
}

impl TableRenderer {
    pub fn new(use_glyphs: bool, show_row_numbers: bool) -> Self {
        Self {
            use_glyphs,
            show_row_numbers,
            displayed: Mutex::new(Vec::new()),
        }
    }

    /// Results shown since the last cleared page
    pub fn displayed(&self) -> Vec<Business> {
        self.displayed.lock().clone()
    }

    fn rating_cell(&self, business: &Business) -> String {
        match business.rating {
            Some(rating) if rating > 0.0 => {
                let mut cell = format!("{} {:.1}", rating_stars(rating, self.use_glyphs), rating);
                if let Some(reviews) = business.reviews.filter(|r| *r > 0) {
                    cell.push_str(&format!(" ({} reviews)", reviews));
                }
                cell
            }
            _ => String::new(),
        }
    }

    fn hours_cell(&self, business: &Business) -> String {
        match &business.opening_hours {
            Some(hours) if hours.open_now => "Open Now".to_string(),
            Some(_) => "Closed".to_string(),
            None => String::new(),
        }
    }

    /// Build the table for `items`, numbering rows from `first_row`
    pub fn build_table(&self, items: &[Business], first_row: usize) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        let mut headers = Vec::new();
        if self.show_row_numbers {
            headers.push("#");
        }
        headers.extend(["Business", "Address", "Phone", "Rating", "Hours", "Type", "Website"]);
        table.set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );

        for (offset, business) in items.iter().enumerate() {
            let mut row = Vec::new();
            if self.show_row_numbers {
                row.push((first_row + offset).to_string());
            }
            row.push(business.name.clone());
            row.push(non_empty(&business.address).unwrap_or_default().to_string());
            row.push(non_empty(&business.phone).unwrap_or_default().to_string());
            row.push(self.rating_cell(business));
            row.push(self.hours_cell(business));
            row.push(non_empty(&business.business_type).unwrap_or_default().to_string());
            row.push(non_empty(&business.website).unwrap_or_default().to_string());
            table.add_row(row);
        }

        table
    }
}

impl ResultRenderer for TableRenderer {
    fn render(&self, directive: RenderDirective) {
        let first_row = {
            let mut displayed = self.displayed.lock();
            if directive.clear {
                displayed.clear();
            }
            let first_row = displayed.len() + 1;
            displayed.extend(directive.items.iter().cloned());
            first_row
        };

        if directive.no_results {
            println!("{}", "No results found".yellow());
        } else if !directive.items.is_empty() {
            println!("{}", self.build_table(&directive.items, first_row));
        }

        println!("{}", directive.total_label.as_str().green());
        if directive.show_load_more {
            println!("{}", "More results available (\\more to load the next page)".dark_grey());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::OpeningHours;

    fn directive(clear: bool, names: &[&str]) -> RenderDirective {
        RenderDirective {
            clear,
            items: names.iter().map(|n| Business::named(n)).collect(),
            total_label: String::new(),
            show_load_more: false,
            no_results: clear && names.is_empty(),
        }
    }

    #[test]
    fn stars_follow_half_star_rule() {
        assert_eq!(rating_stars(4.5, false), "****+");
        assert_eq!(rating_stars(3.2, false), "***..");
        assert_eq!(rating_stars(0.0, false), ".....");
        assert_eq!(rating_stars(7.0, false), "*****");
        assert_eq!(rating_stars(2.7, true), "★★⯪☆☆");
    }

    #[test]
    fn cleared_page_replaces_displayed_results() {
        let renderer = TableRenderer::new(false, true);
        renderer.render(directive(true, &["A", "B"]));
        renderer.render(directive(false, &["C"]));
        assert_eq!(renderer.displayed().len(), 3);

        renderer.render(directive(true, &["X"]));
        let names: Vec<_> = renderer.displayed().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["X"]);
    }

    #[test]
    fn table_rows_number_on_from_previous_pages() {
        let renderer = TableRenderer::new(false, true);
        let mut business = Business::named("Joe's Plumbing");
        business.rating = Some(4.5);
        business.reviews = Some(12);
        business.phone = Some("".into());
        business.opening_hours = Some(OpeningHours { open_now: true });

        let rendered = renderer.build_table(&[business], 11).to_string();
        assert!(rendered.contains("11"));
        assert!(rendered.contains("****+ 4.5 (12 reviews)"));
        assert!(rendered.contains("Open Now"));
    }
}
