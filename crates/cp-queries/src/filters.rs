//! List filters
//!
//! A filter combines three independent conditions: status, whether jobs
//! that ended before today are shown, and a case-insensitive free-text
//! search over title and description.

use chrono::NaiveDate;
use cp_models::{Chantier, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChantierFilter {
    /// `None` shows every status
    pub status: Option<Status>,
    pub hide_past: bool,
    /// Free text, matched case-insensitively
    pub search: Option<String>,
}

impl ChantierFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn any_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn hide_past(mut self, hide: bool) -> Self {
        self.hide_past = hide;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = (!text.trim().is_empty()).then_some(text);
        self
    }

    /// Lower-cased, trimmed search needle
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    pub fn matches_status(&self, job: &Chantier) -> bool {
        self.status.map_or(true, |status| job.status == status)
    }

    /// Hidden when it ended before `today` (or its end date is unreadable)
    pub fn matches_time(&self, job: &Chantier, today: NaiveDate) -> bool {
        !self.hide_past || !job.is_past(today)
    }

    pub fn matches_search(&self, job: &Chantier) -> bool {
        match self.needle() {
            Some(needle) => matches_text(job, &needle),
            None => true,
        }
    }

    pub fn matches(&self, job: &Chantier, today: NaiveDate) -> bool {
        self.matches_status(job) && self.matches_time(job, today) && self.matches_search(job)
    }

    /// Apply all conditions, preserving input order
    pub fn apply(&self, jobs: &[Chantier], today: NaiveDate) -> Vec<Chantier> {
        jobs.iter()
            .filter(|job| self.matches(job, today))
            .cloned()
            .collect()
    }
}

/// Case-insensitive match of an already lower-cased needle
pub fn matches_text(job: &Chantier, needle: &str) -> bool {
    job.title.to_lowercase().contains(needle) || job.description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn jobs() -> Vec<Chantier> {
        let mut done = Chantier::new("Bathroom tiles", "2024-02-01", "2024-02-05").with_id("1");
        done.status = Status::Completed;
        let mut current = Chantier::new("Roof repair", "2024-03-08", "2024-03-12").with_id("2");
        current.description = "Replace broken TILES on the north side".into();
        let undated = Chantier::new("Survey", "2024-03-10", "").with_id("3");
        vec![done, current, undated]
    }

    #[test]
    fn test_status_filter() {
        let filtered = ChantierFilter::new().status(Status::Completed).apply(&jobs(), today());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Bathroom tiles");

        assert_eq!(ChantierFilter::new().apply(&jobs(), today()).len(), 3);
    }

    #[test]
    fn test_hide_past_treats_invalid_end_as_past() {
        let filtered = ChantierFilter::new().hide_past(true).apply(&jobs(), today());
        let titles: Vec<&str> = filtered.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["Roof repair"]);
    }

    #[test]
    fn test_hide_past_keeps_job_ending_today() {
        let job = Chantier::new("Last day", "2024-03-01", "2024-03-10");
        assert!(ChantierFilter::new().hide_past(true).matches(&job, today()));
    }

    #[test]
    fn test_search_is_case_insensitive_on_title_and_description() {
        let filtered = ChantierFilter::new().search("  Tiles ").apply(&jobs(), today());
        assert_eq!(filtered.len(), 2);

        assert_eq!(ChantierFilter::new().search("   ").search, None);
    }
}
