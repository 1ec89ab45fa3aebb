//! Services that sit beside the search flow: filter lists and lead forms

pub mod filter_options;
pub mod lead_forms;

pub use filter_options::FilterOptions;
pub use lead_forms::{LeadFormService, ProfessionalRegistration, QuoteRequest};
