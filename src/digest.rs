//! Aggregation of window-filtered records into a digest summary.
//!
//! Pure and deterministic: identical input always yields an identical
//! summary. Sort ties are broken by id so reruns on the same data order
//! items the same way.

use std::collections::{BTreeMap, HashMap};

use crate::model::{Document, Highlight};

/// Derived, immutable aggregate for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSummary {
    pub document_count: u64,
    pub total_words: u64,
    pub highlight_count: u64,
    /// `total_words / document_count`, 0 for an empty window.
    pub average_words_per_document: f64,
    /// Mean hours from creation to archival over documents with both
    /// timestamps; documents missing either are excluded from the mean but
    /// still counted in `document_count`.
    pub average_hours_to_archive: f64,
    /// Distinct in-window documents with at least one highlight.
    pub documents_with_highlights: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub by_location: BTreeMap<String, u64>,
    /// Sorted by archival time descending, then id ascending.
    pub documents: Vec<Document>,
    /// Highlights sorted by creation time ascending, grouped by parent
    /// document in order of first appearance; orphans form a trailing group.
    pub highlight_groups: Vec<HighlightGroup>,
}

/// Highlights attributed to one parent document, or the orphan group when
/// `document_id` is `None` (parent outside the window, or no parent at all).
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightGroup {
    pub document_id: Option<String>,
    pub document_title: Option<String>,
    pub highlights: Vec<Highlight>,
}

impl DigestSummary {
    /// All highlights in render order.
    pub fn highlights(&self) -> impl Iterator<Item = &Highlight> {
        self.highlight_groups.iter().flat_map(|g| g.highlights.iter())
    }
}

/// Builds the summary from window-filtered documents and highlights.
pub fn aggregate(documents: Vec<Document>, highlights: Vec<Highlight>) -> DigestSummary {
    let mut documents = documents;
    documents.sort_by(|a, b| {
        b.archived_at
            .cmp(&a.archived_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let document_count = documents.len() as u64;
    let total_words: u64 = documents.iter().filter_map(|d| d.word_count).sum();
    let average_words_per_document = if document_count == 0 {
        0.0
    } else {
        total_words as f64 / document_count as f64
    };

    let archive_hours: Vec<f64> = documents
        .iter()
        .filter_map(Document::hours_to_archive)
        .collect();
    let average_hours_to_archive = if archive_hours.is_empty() {
        0.0
    } else {
        archive_hours.iter().sum::<f64>() / archive_hours.len() as f64
    };

    let mut by_category: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_source: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_location: BTreeMap<String, u64> = BTreeMap::new();
    for doc in &documents {
        *by_category.entry(doc.category.clone()).or_default() += 1;
        *by_source.entry(doc.source.clone()).or_default() += 1;
        *by_location.entry(doc.location.as_str().to_string()).or_default() += 1;
    }

    // Upstream invariant says highlight text is non-empty; drop any that
    // slip through rather than render blank entries.
    let mut highlights: Vec<Highlight> = highlights
        .into_iter()
        .filter(|h| !h.text.trim().is_empty())
        .collect();
    highlights.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    let highlight_count = highlights.len() as u64;

    let titles: HashMap<&str, &str> = documents
        .iter()
        .map(|d| (d.id.as_str(), d.title.as_str()))
        .collect();

    let mut groups: Vec<HighlightGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut orphans: Vec<Highlight> = Vec::new();
    for highlight in highlights {
        let parent = highlight
            .document_id
            .clone()
            .filter(|id| titles.contains_key(id.as_str()));
        match parent {
            Some(id) => {
                if let Some(&at) = group_index.get(&id) {
                    groups[at].highlights.push(highlight);
                } else {
                    group_index.insert(id.clone(), groups.len());
                    let title = titles.get(id.as_str()).map(|t| t.to_string());
                    groups.push(HighlightGroup {
                        document_id: Some(id),
                        document_title: title,
                        highlights: vec![highlight],
                    });
                }
            }
            // Orphaned parent references are expected, not an error: keep
            // the highlight, just without a document block.
            None => orphans.push(highlight),
        }
    }
    let documents_with_highlights = group_index.len() as u64;
    if !orphans.is_empty() {
        groups.push(HighlightGroup {
            document_id: None,
            document_title: None,
            highlights: orphans,
        });
    }

    DigestSummary {
        document_count,
        total_words,
        highlight_count,
        average_words_per_document,
        average_hours_to_archive,
        documents_with_highlights,
        by_category,
        by_source,
        by_location,
        documents,
        highlight_groups: groups,
    }
}
