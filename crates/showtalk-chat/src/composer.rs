//! Renders episode records into the grounding text given to the model.

use showtalk_core::types::EpisodeRecord;

/// Context used when the search found nothing.
pub const NO_RESULTS: &str = "No matching episodes found.";

/// Placed between rendered episodes.
pub const SEPARATOR: &str = "\n\n---\n\n";

/// Render records in input order, or [`NO_RESULTS`] when there are none.
pub fn compose(records: &[EpisodeRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }
    records
        .iter()
        .map(render_episode)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn render_episode(record: &EpisodeRecord) -> String {
    format!(
        "Title: {}\nDescription: {}\nIMDB Rating: {}",
        record.title,
        record.description,
        format_rating(record.rating)
    )
}

/// Shortest round-trip form, keeping one decimal for whole numbers (`9.0`).
///
/// Magnitudes of 1e16 and above print positionally (`10000000000000000.0`),
/// not in exponent form.
fn format_rating(rating: f64) -> String {
    if rating.is_finite() && rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}
