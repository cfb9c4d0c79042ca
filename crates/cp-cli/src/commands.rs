//! Subcommand handlers

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use cp_core::config::AppConfig;
use cp_core::dates::{format_range, start_of_today};
use cp_models::Chantier;
use cp_queries::{ListQuery, ListView};
use cp_scheduling::{CalendarMonth, DragSession};
use cp_store::{ChantierStore, FileCache};
use cp_sync::{AutoSync, HttpRemoteStore, LoadSource, SweepOutcome, SyncEngine};
use tracing::{info, warn};

use crate::export::write_csv;

pub struct App {
    config: AppConfig,
    engine: Arc<SyncEngine>,
    offline: bool,
}

impl App {
    /// File cache plus HTTP remote store, as configured
    pub fn from_config(config: AppConfig, offline: bool) -> Result<Self> {
        let cache = FileCache::open(&config.cache.dir)
            .with_context(|| format!("opening cache at {}", config.cache.dir.display()))?;
        let store = ChantierStore::new(Arc::new(cache)).into_handle();
        let remote = HttpRemoteStore::from_config(&config)?;
        let engine = SyncEngine::from_config(store, Arc::new(remote), &config);
        Ok(Self::with_engine(config, Arc::new(engine), offline))
    }

    pub fn with_engine(config: AppConfig, engine: Arc<SyncEngine>, offline: bool) -> Self {
        Self {
            config,
            engine,
            offline,
        }
    }

    /// Bring the store up to date.
    ///
    /// Cached records that never reached the server are pushed first, so
    /// loading the remote collection does not drop them.
    async fn load(&self) -> LoadSource {
        let (count, pending) = {
            let mut store = self.engine.store().write();
            let count = store.load_from_cache();
            let pending = store.jobs().iter().any(|j| !j.has_object_id());
            (count, pending)
        };
        if self.offline {
            return LoadSource::Cache(count);
        }
        if pending {
            info!("Cached changes not yet on the server, syncing first");
            let outcome = self.engine.sync_with_backend().await;
            if !outcome.is_full() {
                warn!(?outcome, "Cached changes could not all be pushed");
                return LoadSource::Cache(self.engine.store().read().len());
            }
        }
        self.engine.initial_load().await
    }

    fn report_load(source: LoadSource) {
        if let LoadSource::Cache(count) = source {
            println!("(offline: {} cached jobs)", count);
        }
    }

    pub async fn list(&self, query: ListQuery) -> Result<()> {
        Self::report_load(self.load().await);
        let jobs = self.engine.store().read().snapshot();
        let view = query.run(&jobs, start_of_today());

        if view.hierarchy.is_empty() {
            println!("No chantiers.");
        }
        for line in render_list(&view) {
            println!("{}", line);
        }
        Ok(())
    }

    pub async fn calendar(&self, month: Option<&str>) -> Result<()> {
        let today = start_of_today();
        let anchor = match month {
            Some(raw) => parse_month(raw)?,
            None => today,
        };
        Self::report_load(self.load().await);

        let jobs = self.engine.store().read().snapshot();
        let calendar = CalendarMonth::build_with_hours(
            anchor,
            &jobs,
            today,
            &self.config.team.working_hours,
        );
        print!("{}", render_calendar(&calendar));
        Ok(())
    }

    pub async fn add(&self, draft: Chantier) -> Result<()> {
        Self::report_load(self.load().await);
        if self.offline {
            let local = self.engine.create_local(draft)?;
            println!("Saved locally as {}", local.id.as_deref().unwrap_or_default());
            return Ok(());
        }

        match self.engine.create(draft).await {
            Ok(created) => {
                println!("Created {}", created.id.as_deref().unwrap_or_default());
                Ok(())
            }
            Err(err) if err.is_transient() => {
                println!("Saved locally, run `sync` once the server is reachable ({})", err);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn move_job(&self, id: &str, day: &str) -> Result<()> {
        Self::report_load(self.load().await);

        let mut session = DragSession::new();
        session.start(id);
        let drag_drop = session
            .drop_on(Some(day))
            .ok_or_else(|| anyhow!("{} is not a valid day", day))?;

        match self.engine.reschedule(&drag_drop).await? {
            Some(moved) => println!(
                "{} now {}",
                moved.title,
                format_range(&moved.start_date, &moved.end_date)
            ),
            None => bail!("chantier {} not found", id),
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        Self::report_load(self.load().await);
        if !self.engine.store().read().contains(id) {
            bail!("unknown chantier {}", id);
        }
        self.engine.delete(id).await?;
        println!("Deleted {}", id);
        Ok(())
    }

    pub async fn sync(&self) -> Result<()> {
        self.engine.store().write().load_from_cache();
        let outcome = self.engine.sync_with_backend().await;
        println!("{}", describe_outcome(&outcome));
        match outcome {
            SweepOutcome::Full(_) => Ok(()),
            SweepOutcome::Offline { .. } => bail!("remote store unreachable"),
            _ => bail!("sync incomplete"),
        }
    }

    pub async fn save_all(&self) -> Result<()> {
        self.engine.store().write().load_from_cache();
        let report = self.engine.save_all().await;
        println!(
            "saved {}, recreated {}, skipped {}, failed {}",
            report.saved,
            report.recreated,
            report.skipped,
            report.failed()
        );
        for (id, message) in &report.failures {
            println!("  {}: {}", id, message);
        }
        if report.is_success() {
            Ok(())
        } else {
            bail!("{} chantiers could not be saved", report.failed())
        }
    }

    pub async fn export(&self, output: &Path) -> Result<()> {
        let jobs = self.engine.remote().fetch_all().await?;
        if jobs.is_empty() {
            bail!("No data found");
        }
        let file = File::create(output)
            .with_context(|| format!("creating {}", output.display()))?;
        let rows = write_csv(&jobs, &mut BufWriter::new(file))?;
        println!("Exported {} chantiers to {}", rows, output.display());
        Ok(())
    }

    /// Auto-sync until `shutdown` resolves, then flush unsaved changes
    pub async fn watch<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.engine.store().write().load_from_cache();
        let handle = AutoSync::from_config(Arc::clone(&self.engine), &self.config).spawn();
        info!(
            interval_secs = self.config.sync.interval_seconds,
            "Watching, press Ctrl+C to stop"
        );

        shutdown.await;
        handle.shutdown().await;

        if let Some(outcome) = self.engine.flush_on_exit().await {
            println!("{}", describe_outcome(&outcome));
        }
        Ok(())
    }
}

/// `YYYY-MM` to the first of that month
pub fn parse_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month {:?}, expected YYYY-MM", raw))
}

pub fn describe_outcome(outcome: &SweepOutcome) -> String {
    match outcome {
        SweepOutcome::Full(report) => format!("Synchronisé avec succès ({} operations)", report.attempted),
        SweepOutcome::Partial(report) | SweepOutcome::Failed(report) => format!(
            "Synchronisé partiellement ({}/{})",
            report.succeeded, report.attempted
        ),
        SweepOutcome::Offline { attempts } => format!(
            "Erreur de synchronisation. Mode hors ligne activé. ({} attempts)",
            attempts
        ),
        SweepOutcome::Skipped => "Sync already running".to_string(),
    }
}

fn list_line(job: &Chantier, depth: usize) -> String {
    let indent = "    ".repeat(depth);
    let mut line = format!(
        "{}{}  {}  [{}] {}",
        indent,
        job.title,
        format_range(&job.start_date, &job.end_date),
        job.status.label(),
        job.urgency.label()
    );
    if !job.assignees.is_empty() {
        line.push_str(&format!("  ({})", job.assignees.join(", ")));
    }
    if let Some(id) = job.id.as_deref() {
        line.push_str(&format!("  #{}", id));
    }
    line
}

/// Roots by start date, children indented under their parent.
///
/// Children without a visible root parent are not shown.
pub fn render_list(view: &ListView) -> Vec<String> {
    view.hierarchy
        .rows()
        .into_iter()
        .map(|row| list_line(row.job, usize::from(row.depth)))
        .collect()
}

pub fn render_calendar(calendar: &CalendarMonth) -> String {
    let mut out = format!("{}\n Mo  Tu  We  Th  Fr  Sa  Su\n", calendar.title());

    for week in calendar.weeks() {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                let marker = if cell.is_today {
                    '*'
                } else if !cell.in_current_month {
                    '.'
                } else if cell.jobs.is_empty() {
                    ' '
                } else {
                    '+'
                };
                format!("{:>3}{}", cell.date.day(), marker)
            })
            .collect();
        out.push_str(row.join("").trim_end());
        out.push('\n');
    }

    for cell in calendar.cells().iter().filter(|c| c.in_current_month) {
        if cell.jobs.is_empty() {
            continue;
        }
        let titles: Vec<&str> = cell.jobs.iter().map(|j| j.title.as_str()).collect();
        out.push_str(&format!("{}: {}\n", cell.date, titles.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_queries::ChantierFilter;
    use cp_sync::InMemoryRemoteStore;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-02").unwrap(), d("2024-02-01"));
        assert!(parse_month("February").is_err());
    }

    #[test]
    fn test_render_list_nests_children() {
        let jobs = vec![
            Chantier::new("Renovation", "2024-03-01", "2024-03-20").with_id("R"),
            Chantier::new("Plumbing", "2024-03-02", "2024-03-04")
                .with_id("C1")
                .with_parent("R"),
            Chantier::new("Garden", "2024-04-01", "2024-04-02").with_id("G"),
        ];
        let view = ListQuery::new()
            .filter(ChantierFilter::new())
            .run(&jobs, d("2024-01-01"));

        let lines = render_list(&view);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Renovation"));
        assert!(lines[1].starts_with("    Plumbing"));
        assert!(lines[2].starts_with("Garden"));
        assert!(lines[0].contains("Mar 1, 2024 - Mar 20, 2024"));
        assert!(lines[0].contains("[En cours]"));
    }

    #[test]
    fn test_render_list_hides_dangling_child() {
        let jobs = vec![
            Chantier::new("Renovation", "2024-03-01", "2024-03-20").with_id("R"),
            Chantier::new("Lost", "2024-03-02", "2024-03-04")
                .with_id("L")
                .with_parent("gone"),
        ];
        let view = ListQuery::new()
            .filter(ChantierFilter::new())
            .run(&jobs, d("2024-01-01"));
        assert_eq!(view.hierarchy.orphans().len(), 1);

        let lines = render_list(&view);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Renovation"));
        assert!(lines.iter().all(|l| !l.contains("Lost")));
    }

    #[test]
    fn test_render_calendar() {
        let jobs = vec![Chantier::new("Roof repair", "2024-02-28", "2024-03-01").with_id("A")];
        let calendar = CalendarMonth::build(d("2024-02-10"), &jobs, d("2024-02-14"));
        let text = render_calendar(&calendar);

        assert!(text.starts_with("February 2024\n"));
        assert_eq!(text.lines().filter(|l| l.contains("Roof repair")).count(), 2);
        assert!(text.contains(" 14*"));
        assert!(text.contains("2024-02-28: Roof repair"));
        assert!(!text.contains("2024-03-01: Roof repair"));
    }

    #[tokio::test]
    async fn test_offline_add_then_sync() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCache::open(dir.path()).unwrap());
        let remote = Arc::new(InMemoryRemoteStore::new());
        let engine = Arc::new(SyncEngine::new(
            ChantierStore::new(cache).into_handle(),
            remote.clone(),
        ));

        let offline = App::with_engine(AppConfig::default(), Arc::clone(&engine), true);
        offline
            .add(Chantier::new("Roof repair", "2024-03-01", "2024-03-03"))
            .await
            .unwrap();
        assert!(remote.is_empty());

        let online = App::with_engine(AppConfig::default(), engine, false);
        online.sync().await.unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote.records()[0].title, "Roof repair");
    }

    #[tokio::test]
    async fn test_offline_add_rejects_invalid_draft() {
        let remote = Arc::new(InMemoryRemoteStore::new());
        let engine = Arc::new(SyncEngine::new(
            ChantierStore::new(Arc::new(cp_store::MemoryCache::new())).into_handle(),
            remote.clone(),
        ));
        let offline = App::with_engine(AppConfig::default(), Arc::clone(&engine), true);

        let err = offline
            .add(Chantier::new("   ", "tomorrow", ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<cp_core::PlanError>(),
            Some(cp_core::PlanError::Validation(_))
        ));
        assert!(engine.store().read().is_empty());
        assert!(!engine.has_unsaved_changes());

        let outcome = engine.sync_with_backend().await;
        assert!(outcome.is_full());
        assert_eq!(remote.count_calls("POST"), 0);
    }
}
