use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::api::models::Business;

const HEADERS: [&str; 8] = [
    "name",
    "address",
    "phone",
    "website",
    "rating",
    "reviews",
    "business_type",
    "open_now",
];

/// Write the given results to `path` as CSV. Returns the number of rows written.
pub fn export_to_csv(businesses: &[Business], path: &Path) -> Result<usize> {
    if businesses.is_empty() {
        return Err(anyhow!("No results to export - run a search first"));
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADERS)?;

    for business in businesses {
        writer.write_record([
            business.name.clone(),
            business.address.clone().unwrap_or_default(),
            business.phone.clone().unwrap_or_default(),
            business.website.clone().unwrap_or_default(),
            business.rating.map(|r| r.to_string()).unwrap_or_default(),
            business.reviews.map(|r| r.to_string()).unwrap_or_default(),
            business.business_type.clone().unwrap_or_default(),
            business
                .opening_hours
                .as_ref()
                .map(|h| h.open_now.to_string())
                .unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(businesses.len())
}
