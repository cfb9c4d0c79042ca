//! The list query pipeline
//!
//! status filter -> hide past -> search with family inclusion -> sort ->
//! parent/child grouping

use chrono::NaiveDate;
use cp_models::Chantier;

use crate::filters::ChantierFilter;
use crate::hierarchy::{family_inclusion, Hierarchy};
use crate::sorts::SortOrder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    filter: ChantierFilter,
    sort: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: ChantierFilter::default(),
            sort: SortOrder::list_default(),
        }
    }
}

/// Result of a list query
#[derive(Debug, Clone, Default)]
pub struct ListView {
    /// Visible jobs in sort order
    pub jobs: Vec<Chantier>,
    /// The same jobs grouped for rendering
    pub hierarchy: Hierarchy,
}

impl ListView {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: ChantierFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn filter_ref(&self) -> &ChantierFilter {
        &self.filter
    }

    pub fn run(&self, jobs: &[Chantier], today: NaiveDate) -> ListView {
        let mut visible: Vec<Chantier> = jobs
            .iter()
            .filter(|job| self.filter.matches_status(job) && self.filter.matches_time(job, today))
            .cloned()
            .collect();

        if self.filter.needle().is_some() {
            let matches: Vec<Chantier> = visible
                .iter()
                .filter(|job| self.filter.matches_search(job))
                .cloned()
                .collect();
            // relatives come from the whole collection, but must still pass
            // the status and date filters
            let included = family_inclusion(jobs, &matches);
            visible.retain(|job| match &job.id {
                Some(id) => included.contains(id),
                None => self.filter.matches_search(job),
            });
        }

        self.sort.sort(&mut visible);
        let hierarchy = Hierarchy::build(&visible);

        ListView {
            jobs: visible,
            hierarchy,
        }
    }
}
