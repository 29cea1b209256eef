use crate::scrape::ScrapedPage;
use crate::search::SearchResultPage;

/// Formats a results page as a numbered listing
///
/// Each entry shows the title, URL, the publication date when known
/// (`YYYY-MM-DD`) and the snippet, followed by a blank line. When the page
/// has a continuation, the arguments for requesting it close the listing.
pub fn format_search_page(page: &SearchResultPage) -> String {
    let mut lines = vec![
        format!("Search: {}", page.query),
        format!("Results: {}", page.results.len()),
        String::new(),
    ];

    for (i, result) in page.results.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, result.title));
        lines.push(format!("     {}", result.url));
        if let Some(published) = result.published_at {
            lines.push(format!("     {}", published.format("%Y-%m-%d")));
        }
        lines.push(format!("     {}", result.snippet));
        lines.push(String::new());
    }

    if let (Some(token), Some(offset)) = (&page.pagination_token, page.next_offset) {
        lines.push(format!("Next page: --offset {} --token {}", offset, token));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Formats a scraped page: header, markdown body, then its links
pub fn format_scraped_page(page: &ScrapedPage) -> String {
    let mut lines = vec![
        format!("URL: {}", page.source_url),
        format!("Links: {}", page.links.len()),
        String::new(),
        page.markdown.trim().to_string(),
    ];

    if !page.links.is_empty() {
        lines.push(String::new());
        lines.push("--- Links ---".to_string());
        lines.extend(
            page.links
                .iter()
                .map(|link| format!("  [{}]({})", link.text, link.url)),
        );
    }
    lines.push(String::new());

    lines.join("\n")
}
