//! Drag-to-reschedule

use chrono::NaiveDate;
use cp_core::dates::{parse_date, DateValue};
use cp_core::traits::ChantierId;
use cp_models::Chantier;
use tracing::debug;

/// Move a job to start on `new_start`, keeping its duration.
///
/// Works on a copy. The duration comes from the original dates, clamped to
/// zero; a job with an unreadable date becomes a single-day job.
pub fn reschedule_by_drag(job: &Chantier, new_start: NaiveDate) -> Chantier {
    let mut moved = job.clone();
    moved.set_date_range(job.date_range().shifted_to(new_start));
    moved.touch();
    moved
}

/// A resolved drop: which job goes to which day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragDrop {
    pub job_id: ChantierId,
    pub day: NaiveDate,
}

impl DragDrop {
    /// Apply the drop to the matching job in `jobs`
    pub fn apply(&self, jobs: &[Chantier]) -> Option<Chantier> {
        jobs.iter()
            .find(|j| j.id.as_deref() == Some(self.job_id.as_str()))
            .map(|job| reschedule_by_drag(job, self.day))
    }
}

/// Tracks the job currently being dragged
#[derive(Debug, Default, Clone)]
pub struct DragSession {
    dragged: Option<ChantierId>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, job_id: impl Into<ChantierId>) {
        self.dragged = Some(job_id.into());
    }

    pub fn cancel(&mut self) {
        self.dragged = None;
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.dragged.is_some()
    }

    /// Resolve a drop on `target` (a `YYYY-MM-DD` day) and end the session.
    ///
    /// No dragged job, no target or a target that is not a valid day is a
    /// no-op.
    pub fn drop_on(&mut self, target: Option<&str>) -> Option<DragDrop> {
        let job_id = self.dragged.take()?;
        let Some(raw) = target else {
            debug!(job_id = %job_id, "Drop outside of a day, ignored");
            return None;
        };
        match parse_date(raw) {
            DateValue::Valid(day) => Some(DragDrop { job_id, day }),
            DateValue::Invalid(_) => {
                debug!(job_id = %job_id, target = raw, "Drop target is not a day, ignored");
                None
            }
        }
    }
}
