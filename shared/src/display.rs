use std::fmt::Write;

use crate::venue::Venue;

/// `★ 4.5 (120)`, or `★ 4.5` without a review count.
pub fn format_rating(rating: f64, review_count: Option<u32>) -> String {
    let mut out = format!("★ {rating:.1}");
    if let Some(count) = review_count {
        let _ = write!(out, " ({count})");
    }
    out
}

/// One `$` per price level, clamped to 1..=4.
pub fn format_price_range(level: u8) -> String {
    "$".repeat(level.clamp(1, 4) as usize)
}

pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    if !latitude.is_finite() || !longitude.is_finite() {
        return "—".to_string();
    }
    format!("{latitude:.4}, {longitude:.4}")
}

/// Short date for an RFC3339 timestamp; unparseable input is returned as-is.
pub fn format_short_date(rfc3339: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(rfc3339) {
        Ok(dt) => dt.format("%b %d, %Y").to_string(),
        Err(_) => rfc3339.to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Popup body shown when a marker is opened.
pub fn marker_popup_html(venue: &Venue) -> String {
    let mut html = format!(
        r#"<div class="venue-popup"><h3 class="venue-popup-name">{}</h3>"#,
        escape_html(&venue.name)
    );
    if let Some(address) = venue.address.as_deref().filter(|a| !a.is_empty()) {
        let _ = write!(
            html,
            r#"<p class="venue-popup-address">{}</p>"#,
            escape_html(address)
        );
    }
    html.push_str("</div>");
    html
}
