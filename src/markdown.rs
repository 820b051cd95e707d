//! Markdown rendering of a digest summary.
//!
//! `render` is a pure function of the summary and window: no clock, no
//! randomness. Identical input renders byte-identical output, which the
//! publisher relies on to skip commits when nothing changed.

use chrono::SecondsFormat;

use crate::digest::DigestSummary;
use crate::window::DateWindow;

/// Display names for sources whose naive title-casing reads wrong.
const SOURCE_SPECIAL_CASES: [(&str, &str); 8] = [
    ("ios", "iOS"),
    ("macos", "macOS"),
    ("rss", "RSS"),
    ("api", "API"),
    ("url", "URL"),
    ("pdf", "PDF"),
    ("epub", "EPUB"),
    ("html", "HTML"),
];

/// Renders the digest document: front matter, overview, breakdowns,
/// archived-item list and highlights.
pub fn render(summary: &DigestSummary, window: &DateWindow) -> String {
    let start = window.start.date_naive();
    let end = window.end.date_naive();
    let title = format!("Weekly Reading Digest - {start} to {end}");

    let mut lines: Vec<String> = Vec::new();

    lines.push("---".to_string());
    lines.push(format!("title: \"{title}\""));
    lines.push(format!(
        "date: {}",
        window.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push("draft: false".to_string());
    lines.push("tags: [\"reading\", \"digest\", \"readwise\"]".to_string());
    lines.push("categories: [\"Reading\"]".to_string());
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push(format!("# {title}"));
    lines.push(String::new());

    overview(&mut lines, summary);

    if summary.document_count > 0 {
        breakdowns(&mut lines, summary);
    }

    highlights(&mut lines, summary);

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!(
        "*Generated for the week of {start} using the Readwise API.*"
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn overview(lines: &mut Vec<String>, summary: &DigestSummary) {
    lines.push("## Overview".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- **Articles Archived**: {}",
        group_digits(summary.document_count)
    ));
    lines.push(format!(
        "- **Total Words Read**: {}",
        group_digits(summary.total_words)
    ));
    lines.push(format!(
        "- **Average Words per Article**: {}",
        format_average(summary.average_words_per_document)
    ));
    lines.push(format!(
        "- **Average Hours to Archive**: {}",
        format_average(summary.average_hours_to_archive)
    ));
    lines.push(format!(
        "- **Highlights Created**: {}",
        group_digits(summary.highlight_count)
    ));
    lines.push(format!(
        "- **Articles with Highlights**: {}",
        group_digits(summary.documents_with_highlights)
    ));
    lines.push(String::new());
}

fn breakdowns(lines: &mut Vec<String>, summary: &DigestSummary) {
    lines.push("## Article Breakdowns".to_string());
    lines.push(String::new());

    breakdown_section(lines, "By Category", &summary.by_category, title_case);
    breakdown_section(lines, "By Source", &summary.by_source, format_source_name);
    breakdown_section(lines, "By Location", &summary.by_location, title_case);

    if !summary.documents.is_empty() {
        lines.push("### Archived Articles".to_string());
        lines.push(String::new());
        for doc in &summary.documents {
            let mut line = match &doc.source_url {
                Some(url) if !url.is_empty() => format!("- **[{}]({})**", doc.title, url),
                _ => format!("- **{}**", doc.title),
            };
            if let Some(author) = doc.author.as_deref().filter(|a| !a.trim().is_empty()) {
                line.push_str(&format!(" by {author}"));
            }
            let mut meta: Vec<String> = Vec::new();
            if let Some(words) = doc.word_count.filter(|w| *w > 0) {
                meta.push(format!("{} words", group_digits(words)));
            }
            if let Some(hours) = doc.hours_to_archive() {
                meta.push(format!("archived after {} hours", format_average(hours)));
            }
            if !meta.is_empty() {
                line.push_str(&format!(" ({})", meta.join(", ")));
            }
            lines.push(line);
            if let Some(summary_text) = doc.summary.as_deref().filter(|s| !s.trim().is_empty()) {
                lines.push(format!("  - {summary_text}"));
            }
        }
        lines.push(String::new());
    }
}

fn breakdown_section(
    lines: &mut Vec<String>,
    heading: &str,
    map: &std::collections::BTreeMap<String, u64>,
    display: fn(&str) -> String,
) {
    if map.is_empty() {
        return;
    }
    lines.push(format!("### {heading}"));
    lines.push(String::new());
    // Count descending, then key ascending, so reruns order entries the
    // same way.
    let mut entries: Vec<(&String, &u64)> = map.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (key, count) in entries {
        lines.push(format!("- **{}**: {}", display(key), count));
    }
    lines.push(String::new());
}

fn highlights(lines: &mut Vec<String>, summary: &DigestSummary) {
    lines.push("## Highlights from the Past Week".to_string());
    lines.push(String::new());

    if summary.highlight_count == 0 {
        lines.push("No highlights were created this week.".to_string());
        lines.push(String::new());
        return;
    }

    let mut number = 0usize;
    for group in &summary.highlight_groups {
        match group.document_title.as_deref() {
            Some(title) => lines.push(format!("**{title}**")),
            None => lines.push("### Other Highlights".to_string()),
        }
        lines.push(String::new());
        for highlight in &group.highlights {
            number += 1;
            lines.push(format!("{number}. \"{}\"", highlight.text));
            if let Some(note) = highlight.note.as_deref().filter(|n| !n.trim().is_empty()) {
                lines.push(format!("   - *Note: {note}*"));
            }
            lines.push(String::new());
        }
    }
}

/// Thousands-grouped decimal rendering, e.g. 12450 -> "12,450".
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Two-decimal rendering with a thousands-grouped integer part,
/// e.g. 2490.0 -> "2,490.00".
fn format_average(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;
    format!("{}.{:02}", group_digits(whole), cents)
}

/// Capitalizes each word, splitting on underscores, dashes and spaces.
fn title_case(value: &str) -> String {
    value
        .split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`title_case`], but with the acronym/brand spellings readers expect
/// (reader_rss -> "Reader RSS", ios -> "iOS").
fn format_source_name(source: &str) -> String {
    let lower = source.to_lowercase();
    for (raw, display) in SOURCE_SPECIAL_CASES {
        if lower == raw {
            return display.to_string();
        }
    }
    source
        .split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let part_lower = part.to_lowercase();
            for (raw, display) in SOURCE_SPECIAL_CASES {
                if part_lower == raw {
                    return display.to_string();
                }
            }
            title_case(part)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::aggregate;
    use crate::model::{Document, Highlight};
    use crate::window::DateWindow;
    use chrono::{DateTime, TimeZone, Utc};

    fn window() -> DateWindow {
        DateWindow::trailing_week(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap())
    }

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    #[test]
    fn grouping_and_averages_format_as_expected() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(12_450), "12,450");
        assert_eq!(group_digits(1_234_567), "1,234,567");
        assert_eq!(format_average(0.0), "0.00");
        assert_eq!(format_average(2490.0), "2,490.00");
        assert_eq!(format_average(18.254), "18.25");
        assert_eq!(format_average(2.999), "3.00");
    }

    #[test]
    fn source_names_use_special_case_spellings() {
        assert_eq!(format_source_name("rss"), "RSS");
        assert_eq!(format_source_name("reader_ios"), "Reader iOS");
        assert_eq!(format_source_name("import_url"), "Import URL");
        assert_eq!(format_source_name("mail"), "Mail");
        assert_eq!(title_case("article"), "Article");
    }

    #[test]
    fn render_is_deterministic() {
        let documents = vec![sample_document()];
        let highlights = vec![sample_highlight()];
        let summary = aggregate(documents, highlights);
        let first = render(&summary, &window());
        let second = render(&summary, &window());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_window_renders_minimal_digest() {
        let summary = aggregate(Vec::new(), Vec::new());
        let rendered = render(&summary, &window());

        assert!(rendered.starts_with("---\n"));
        assert!(rendered
            .contains("title: \"Weekly Reading Digest - 2024-01-01 to 2024-01-08\""));
        assert!(rendered.contains("date: 2024-01-08T00:00:00Z"));
        assert!(rendered.contains("- **Articles Archived**: 0"));
        assert!(rendered.contains("- **Average Words per Article**: 0.00"));
        assert!(rendered.contains("- **Average Hours to Archive**: 0.00"));
        assert!(rendered.contains("No highlights were created this week."));
        assert!(!rendered.contains("## Article Breakdowns"));
        assert!(!rendered.contains("### Archived Articles"));
        assert!(rendered.ends_with(
            "*Generated for the week of 2024-01-01 using the Readwise API.*\n"
        ));
    }

    #[test]
    fn full_digest_renders_every_section() {
        let mut with_url = sample_document();
        with_url.id = "d2".to_string();
        with_url.title = "Linked".to_string();
        with_url.author = None;
        with_url.source_url = Some("https://example.com/a".to_string());
        with_url.word_count = Some(1_200);
        with_url.archived_at = Some(utc(6, 12));
        with_url.created_at = Some(utc(6, 0));

        let documents = vec![sample_document(), with_url];
        let mut noted = sample_highlight();
        noted.id = 2;
        noted.note = Some("revisit".to_string());
        noted.created_at = Some(utc(5, 9));
        let orphan = Highlight {
            id: 3,
            document_id: Some("gone".to_string()),
            text: "orphaned".to_string(),
            note: None,
            created_at: Some(utc(6, 9)),
        };
        let summary = aggregate(documents, vec![sample_highlight(), noted, orphan]);
        let rendered = render(&summary, &window());

        assert!(rendered.contains("## Article Breakdowns"));
        assert!(rendered.contains("### By Category"));
        assert!(rendered.contains("- **Article**: 2"));
        assert!(rendered.contains("### By Source"));
        assert!(rendered.contains("- **Reader RSS**: 2"));
        assert!(rendered.contains("### By Location"));
        assert!(rendered.contains("- **Archive**: 2"));

        // newest archived first, with link, words and archive delay
        assert!(rendered.contains(
            "- **[Linked](https://example.com/a)** (1,200 words, archived after 12.00 hours)"
        ));
        assert!(rendered.contains("- **Deep Focus** by Ann Author"));

        // attributed group under its document title, orphan under the
        // general section, numbered continuously
        assert!(rendered.contains("**Deep Focus**\n\n1. \"worth keeping\""));
        assert!(rendered.contains("2. \"worth keeping\"\n   - *Note: revisit*"));
        assert!(rendered.contains("### Other Highlights\n\n3. \"orphaned\""));
    }

    #[test]
    fn missing_optionals_are_omitted_not_rendered_blank() {
        let mut doc = sample_document();
        doc.author = None;
        doc.word_count = None;
        doc.created_at = None;
        doc.summary = None;
        let summary = aggregate(vec![doc], Vec::new());
        let rendered = render(&summary, &window());

        assert!(rendered.contains("- **Deep Focus**\n"));
        assert!(!rendered.contains("by "));
        assert!(!rendered.contains("words"));
        assert!(!rendered.contains("()"));
    }

    fn sample_document() -> Document {
        let mut doc: Document = serde_json::from_str(
            r#"{
                "id": "d1",
                "title": "Deep Focus",
                "author": "Ann Author",
                "category": "article",
                "source": "reader_rss",
                "location": "archive"
            }"#,
        )
        .unwrap();
        doc.word_count = Some(2_450);
        doc.created_at = Some(utc(4, 0));
        doc.archived_at = Some(utc(5, 6));
        doc
    }

    fn sample_highlight() -> Highlight {
        Highlight {
            id: 1,
            document_id: Some("d1".to_string()),
            text: "worth keeping".to_string(),
            note: None,
            created_at: Some(utc(5, 8)),
        }
    }
}
