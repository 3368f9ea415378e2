//! View State
//!
//! Display-ready values derived from records and envelopes, kept out of
//! the components so they can be tested on the host.

use crate::api::ApiResponse;
use crate::domain::{Memory, MemoryType, Timestamp};

/// Visible tags on a memory card before collapsing into `+N`
pub const CARD_TAG_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Loading,
    Empty,
    Failed(String),
    Ready(T),
}

impl<T> LoadState<T> {
    pub fn from_response(response: ApiResponse<T>) -> Self {
        match response {
            ApiResponse::Ok(data) => LoadState::Ready(data),
            ApiResponse::Err(message) => LoadState::Failed(message),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

impl<T> LoadState<Vec<T>> {
    /// Like `from_response`, but an empty list is `Empty`
    pub fn from_list(response: ApiResponse<Vec<T>>) -> Self {
        match response {
            ApiResponse::Ok(items) if items.is_empty() => LoadState::Empty,
            other => LoadState::from_response(other),
        }
    }
}

/// Orders overlapping fetches of the same list. Take a ticket when a
/// fetch starts; its result is applied only if nothing newer already was.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSequence {
    issued: u64,
    applied: u64,
}

impl FetchSequence {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn accept(&mut self, ticket: u64) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }
}

pub fn memory_count_label(count: usize) -> String {
    match count {
        1 => "1 memory".to_string(),
        n => format!("{} memories", n),
    }
}

/// e.g. "March 4, 2024"
pub fn format_date(ts: Timestamp) -> String {
    ts.format("%B %-d, %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagSummary {
    pub shown: Vec<String>,
    pub hidden: usize,
}

impl TagSummary {
    pub fn new(tags: &[String], limit: usize) -> Self {
        Self {
            shown: tags.iter().take(limit).cloned().collect(),
            hidden: tags.len().saturating_sub(limit),
        }
    }

    /// `+N` for the collapsed remainder
    pub fn overflow_label(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{}", self.hidden))
    }
}

/// Everything a memory card or detail page renders. While a memory is
/// locked its story and media are withheld and the unlock date is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDisplay {
    pub title: String,
    pub kind: MemoryType,
    pub locked: bool,
    pub story: Option<String>,
    pub media_url: Option<String>,
    pub unlock_label: Option<String>,
    pub created_label: String,
    pub tags: TagSummary,
}

impl MemoryDisplay {
    pub fn new(memory: &Memory, now: Timestamp) -> Self {
        let locked = memory.is_locked(now);
        Self {
            title: memory.title.clone(),
            kind: memory.kind,
            locked,
            story: (!locked).then(|| memory.story.clone()),
            media_url: if locked { None } else { memory.media_url.clone() },
            unlock_label: memory
                .unlock_date
                .filter(|_| locked)
                .map(|date| format!("Unlocks on {}", format_date(date))),
            created_label: format_date(memory.created_at),
            tags: TagSummary::new(&memory.tags, CARD_TAG_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_slow_initial_fetch_does_not_overwrite_snapshot() {
        let mut sequence = FetchSequence::default();
        let initial = sequence.issue();
        let snapshot = sequence.issue();
        assert!(sequence.accept(snapshot));
        assert!(!sequence.accept(initial));

        let reload = sequence.issue();
        assert!(sequence.accept(reload));
        assert!(!sequence.accept(reload));
    }

    fn memory(unlock: Option<Timestamp>) -> Memory {
        Memory {
            id: "m1".into(),
            vault_id: "v1".into(),
            title: "Time Capsule".into(),
            story: "Open me later".into(),
            kind: MemoryType::Photo,
            media_url: Some("https://cdn.example/p.png".into()),
            created_by: "u1".into(),
            tags: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            unlock_date: unlock,
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_locked_display_withholds_content() {
        let now = Utc::now();
        let unlock = now + Duration::days(10);
        let display = MemoryDisplay::new(&memory(Some(unlock)), now);
        assert!(display.locked);
        assert_eq!(display.story, None);
        assert_eq!(display.media_url, None);
        assert_eq!(display.unlock_label, Some(format!("Unlocks on {}", format_date(unlock))));

        let open = MemoryDisplay::new(&memory(None), now);
        assert_eq!(open.story.as_deref(), Some("Open me later"));
        assert_eq!(open.created_label, "March 4, 2024");
    }

    #[test]
    fn test_tag_summary() {
        let display = MemoryDisplay::new(&memory(None), Utc::now());
        assert_eq!(display.tags.shown, vec!["a", "b"]);
        assert_eq!(display.tags.overflow_label().as_deref(), Some("+2"));
        assert_eq!(TagSummary::new(&[], 2).overflow_label(), None);
    }

    #[test]
    fn test_load_state() {
        assert_eq!(LoadState::<Vec<u8>>::from_list(ApiResponse::Ok(vec![])), LoadState::Empty);
        assert_eq!(
            LoadState::<Vec<u8>>::from_list(ApiResponse::Err("offline".into())),
            LoadState::Failed("offline".into())
        );
        assert_eq!(memory_count_label(1), "1 memory");
        assert_eq!(memory_count_label(0), "0 memories");
    }
}
