//! Date window computation and in-window filtering.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::model::{Document, Highlight};

/// A closed-open UTC interval `[start, end)` covering one digest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// The trailing seven days, anchored to midnight of the anchor's
    /// calendar date so repeated invocations on the same day agree.
    pub fn trailing_week(anchor: DateTime<Utc>) -> Self {
        let end = anchor.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            start: end - Duration::days(7),
            end,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Keeps documents whose archival time falls inside the window, preserving
/// input order. Documents without an archival time cannot be proven
/// in-window and are dropped.
pub fn filter_documents(documents: Vec<Document>, window: &DateWindow) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|doc| doc.archived_at.map(|t| window.contains(t)).unwrap_or(false))
        .collect()
}

/// Keeps highlights whose creation time falls inside the window, preserving
/// input order.
pub fn filter_highlights(highlights: Vec<Highlight>, window: &DateWindow) -> Vec<Highlight> {
    highlights
        .into_iter()
        .filter(|h| h.created_at.map(|t| window.contains(t)).unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn document(id: &str, archived_at: Option<DateTime<Utc>>) -> Document {
        let mut doc: Document = serde_json::from_str(&format!(r#"{{"id": "{id}"}}"#)).unwrap();
        doc.archived_at = archived_at;
        doc
    }

    #[test]
    fn trailing_week_is_midnight_aligned_and_seven_days_wide() {
        let window = DateWindow::trailing_week(utc(2024, 1, 8, 14, 31, 7));
        assert_eq!(window.end, utc(2024, 1, 8, 0, 0, 0));
        assert_eq!(window.start, utc(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn window_is_closed_open() {
        let window = DateWindow::trailing_week(utc(2024, 1, 8, 0, 0, 0));
        assert!(window.contains(utc(2024, 1, 1, 0, 0, 0)));
        assert!(window.contains(utc(2024, 1, 7, 23, 59, 59)));
        assert!(!window.contains(utc(2024, 1, 8, 0, 0, 0)));
        assert!(!window.contains(utc(2023, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn document_filter_is_stable_and_drops_out_of_window() {
        let window = DateWindow::trailing_week(utc(2024, 1, 8, 0, 0, 0));
        let input = vec![
            document("c", Some(utc(2024, 1, 5, 12, 0, 0))),
            document("a", Some(utc(2023, 12, 25, 12, 0, 0))),
            document("b", Some(utc(2024, 1, 2, 12, 0, 0))),
            document("d", None),
            document("e", Some(utc(2024, 1, 2, 12, 0, 0))),
        ];
        let kept = filter_documents(input, &window);
        let ids: Vec<&str> = kept.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "e"]);
    }

    #[test]
    fn highlight_filter_uses_creation_time() {
        let window = DateWindow::trailing_week(utc(2024, 1, 8, 0, 0, 0));
        let inside: Highlight = serde_json::from_str(
            r#"{"id": 1, "text": "kept", "highlighted_at": "2024-01-06T10:00:00Z"}"#,
        )
        .unwrap();
        let outside: Highlight = serde_json::from_str(
            r#"{"id": 2, "text": "dropped", "highlighted_at": "2024-01-09T10:00:00Z"}"#,
        )
        .unwrap();
        let kept = filter_highlights(vec![outside, inside], &window);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }
}
