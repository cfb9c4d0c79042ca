//! Command line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cp_models::{Chantier, Status, Urgency};
use cp_queries::{ChantierFilter, ListQuery, SortDirection, SortKey, SortOrder};

#[derive(Parser)]
#[command(name = "chantier-planner")]
#[command(about = "Scheduling board for construction jobs", version)]
#[command(
    after_help = "Environment:\n  CHANTIER_API_URL    REST API root\n  CHANTIER_CACHE_DIR  Local cache directory\n  RUST_LOG            Log filter"
)]
pub struct Cli {
    /// Read from the local cache instead of the remote store
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List jobs, children under their parent
    List(ListArgs),
    /// Print a month calendar
    Calendar {
        /// Month to show, `YYYY-MM` (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Create a job
    Add(AddArgs),
    /// Move a job to start on another day, keeping its duration
    Move {
        id: String,
        /// Target day, `YYYY-MM-DD`
        day: String,
    },
    /// Delete a job
    Delete { id: String },
    /// Push the local collection to the remote store
    Sync,
    /// Save every cached job with a remote id
    SaveAll,
    /// Export the remote collection as CSV
    Export {
        #[arg(long, short, default_value = "chantiers_export.csv")]
        output: PathBuf,
    },
    /// Sync periodically until Ctrl+C
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    All,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Start,
    End,
    Title,
    Urgency,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    pub status: StatusArg,
    /// Hide jobs that ended before today
    #[arg(long, default_value_t = false)]
    pub hide_past: bool,
    /// Case-insensitive text in title or description
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_enum, default_value_t = SortArg::Start)]
    pub sort: SortArg,
    /// Ascending order (default is descending)
    #[arg(long, default_value_t = false)]
    pub asc: bool,
}

impl ListArgs {
    pub fn to_query(&self) -> ListQuery {
        let mut filter = ChantierFilter::new().hide_past(self.hide_past);
        filter = match self.status {
            StatusArg::All => filter.any_status(),
            StatusArg::Ongoing => filter.status(Status::Ongoing),
            StatusArg::Completed => filter.status(Status::Completed),
        };
        if let Some(search) = &self.search {
            filter = filter.search(search.clone());
        }

        let key = match self.sort {
            SortArg::Start => SortKey::StartDate,
            SortArg::End => SortKey::EndDate,
            SortArg::Title => SortKey::Title,
            SortArg::Urgency => SortKey::Urgency,
        };
        let direction = if self.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };

        ListQuery::new()
            .filter(filter)
            .sort(SortOrder::new(key, direction))
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    /// `YYYY-MM-DD`
    #[arg(long)]
    pub start: String,
    /// `YYYY-MM-DD`
    #[arg(long)]
    pub end: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Repeat for several assignees
    #[arg(long = "assignee")]
    pub assignees: Vec<String>,
    /// low, normal, high, urgent or 1-4
    #[arg(long, default_value = "normal")]
    pub urgency: String,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    /// Id of the parent job
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Estimated duration in days
    #[arg(long)]
    pub estimated_duration: Option<u32>,
    /// Quote notes
    #[arg(long)]
    pub devis: Option<String>,
}

impl AddArgs {
    pub fn into_draft(self) -> Chantier {
        let mut draft = Chantier::new(self.title, self.start.as_str(), self.end.as_str())
            .with_assignees(self.assignees);
        draft.description = self.description;
        draft.urgency = Urgency::parse(&self.urgency).unwrap_or_default();
        if let Some(StatusArg::Completed) = self.status {
            draft.status = Status::Completed;
        }
        draft.parent_chantier_id = self.parent;
        draft.address = self.address;
        draft.contact_phone = self.phone;
        draft.contact_email = self.email;
        draft.estimated_duration = self.estimated_duration;
        draft.devis = self.devis.unwrap_or_default();
        draft.normalize();
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use cp_core::dates::DateValue;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_args_build_draft() {
        let cli = Cli::parse_from([
            "chantier-planner",
            "add",
            "--title",
            "Roof repair",
            "--start",
            "2024-03-01",
            "--end",
            "2024-03-03",
            "--assignee",
            "wang",
            "--assignee",
            "wang",
            "--urgency",
            "urgent",
            "--parent",
            "",
        ]);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let draft = args.into_draft();

        assert_eq!(draft.title, "Roof repair");
        assert!(matches!(draft.start_date, DateValue::Valid(_)));
        assert_eq!(draft.assignees, vec!["wang"]);
        assert_eq!(draft.urgency, Urgency::Urgent);
        assert_eq!(draft.parent_chantier_id, None);
        assert!(draft.id.is_none());
    }

    #[test]
    fn test_list_args_to_query() {
        let cli = Cli::parse_from([
            "chantier-planner",
            "--offline",
            "list",
            "--status",
            "completed",
            "--hide-past",
            "--sort",
            "title",
            "--asc",
        ]);
        assert!(cli.offline);
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        let query = args.to_query();

        let expected = ChantierFilter::new()
            .hide_past(true)
            .status(Status::Completed);
        assert_eq!(query.filter_ref(), &expected);
    }
}
