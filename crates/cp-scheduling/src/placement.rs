//! Day placement

use chrono::{Datelike, NaiveDate};
use cp_core::config::WorkingHours;
use cp_models::Chantier;

/// Every job whose `[start, end]` range contains `day`, inclusively.
///
/// Jobs with an unreadable date are never placed. Input order is kept.
pub fn jobs_on_day(jobs: &[Chantier], day: NaiveDate) -> Vec<&Chantier> {
    jobs.iter().filter(|job| job.occurs_on(day)).collect()
}

/// Whether the crew works on `day`
pub fn is_working_day(day: NaiveDate, hours: &WorkingHours) -> bool {
    hours.days.contains(&day.weekday().number_from_monday())
}
