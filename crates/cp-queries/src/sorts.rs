//! Sort orders
//!
//! Sort orders define how list results are ordered. Unreadable dates
//! always sort last, whatever the direction.

use std::cmp::Ordering;

use cp_core::dates::DateValue;
use cp_models::Chantier;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (oldest first)
    #[default]
    Asc,
    /// Descending order (newest first)
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Attribute to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    StartDate,
    EndDate,
    Title,
    Urgency,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "startDate" | "start" => Some(Self::StartDate),
            "endDate" | "end" => Some(Self::EndDate),
            "title" => Some(Self::Title),
            "urgency" => Some(Self::Urgency),
            _ => None,
        }
    }
}

/// A single sort criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn asc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn desc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Ordering of the list view: most recent start first
    pub fn list_default() -> Self {
        Self::desc(SortKey::StartDate)
    }

    pub fn compare(&self, a: &Chantier, b: &Chantier) -> Ordering {
        match self.key {
            SortKey::StartDate => compare_dates(&a.start_date, &b.start_date, self.direction),
            SortKey::EndDate => compare_dates(&a.end_date, &b.end_date, self.direction),
            SortKey::Title => self
                .direction
                .apply(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortKey::Urgency => self.direction.apply(a.urgency.cmp(&b.urgency)),
        }
    }

    /// Stable in-place sort
    pub fn sort(&self, jobs: &mut [Chantier]) {
        jobs.sort_by(|a, b| self.compare(a, b));
    }
}

/// Compare two dates in `direction`, invalid dates last
pub fn compare_dates(a: &DateValue, b: &DateValue, direction: SortDirection) -> Ordering {
    match (a.as_date(), b.as_date()) {
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(jobs: &[Chantier]) -> Vec<&str> {
        jobs.iter().map(|j| j.title.as_str()).collect()
    }

    fn jobs() -> Vec<Chantier> {
        vec![
            Chantier::new("b", "2024-03-02", "2024-03-02"),
            Chantier::new("broken", "n/a", "2024-03-02"),
            Chantier::new("a", "2024-03-01", "2024-03-01"),
            Chantier::new("c", "2024-03-03", "2024-03-03"),
        ]
    }

    #[test]
    fn test_start_date_ascending_invalid_last() {
        let mut list = jobs();
        SortOrder::asc(SortKey::StartDate).sort(&mut list);
        assert_eq!(titles(&list), vec!["a", "b", "c", "broken"]);
    }

    #[test]
    fn test_start_date_descending_invalid_last() {
        let mut list = jobs();
        SortOrder::list_default().sort(&mut list);
        assert_eq!(titles(&list), vec!["c", "b", "a", "broken"]);
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::Asc.reverse(), SortDirection::Desc);
        assert_eq!(SortKey::parse("urgency"), Some(SortKey::Urgency));
    }
}
