//! Month calendar
//!
//! A month view is a [`MonthGrid`] where every cell carries the jobs placed
//! on that day.

use chrono::NaiveDate;
use cp_core::config::WorkingHours;
use cp_core::dates::MonthGrid;
use cp_models::Chantier;

use crate::placement::{is_working_day, jobs_on_day};

const TOOLTIP_DESCRIPTION_LIMIT: usize = 100;

/// One day of the month view
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// `false` for the padding days of the neighbouring months
    pub in_current_month: bool,
    pub is_today: bool,
    pub is_working_day: bool,
    pub jobs: Vec<Chantier>,
}

#[derive(Debug, Clone)]
pub struct CalendarMonth {
    grid: MonthGrid,
    cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    pub fn build(anchor: NaiveDate, jobs: &[Chantier], today: NaiveDate) -> Self {
        Self::build_with_hours(anchor, jobs, today, &WorkingHours::default())
    }

    pub fn build_with_hours(
        anchor: NaiveDate,
        jobs: &[Chantier],
        today: NaiveDate,
        hours: &WorkingHours,
    ) -> Self {
        let grid = MonthGrid::new(anchor);
        let cells = grid
            .days()
            .map(|date| CalendarCell {
                date,
                in_current_month: grid.in_month(date),
                is_today: date == today,
                is_working_day: is_working_day(date, hours),
                jobs: jobs_on_day(jobs, date).into_iter().cloned().collect(),
            })
            .collect();

        Self { grid, cells }
    }

    pub fn grid(&self) -> &MonthGrid {
        &self.grid
    }

    pub fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.date == date)
    }

    /// Cells in rows of seven, Monday first
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    /// e.g. "March 2024"
    pub fn title(&self) -> String {
        self.grid.first_of_month().format("%B %Y").to_string()
    }
}

/// Hover text for a job in the calendar
pub fn tooltip(job: &Chantier) -> String {
    let description = if job.description.is_empty() {
        "Pas de description".to_string()
    } else if job.description.chars().count() > TOOLTIP_DESCRIPTION_LIMIT {
        let truncated: String = job
            .description
            .chars()
            .take(TOOLTIP_DESCRIPTION_LIMIT)
            .collect();
        format!("{}...", truncated)
    } else {
        job.description.clone()
    };
    format!("{}\n{}", job.title, description)
}
