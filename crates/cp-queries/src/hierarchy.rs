//! Parent/child grouping
//!
//! Jobs form a two-level tree through `parentChantierId`. Roots are jobs
//! without a parent; a child is attached only when its parent is one of the
//! roots. Anything else (dangling reference, parent that is itself a child,
//! parent filtered out of the view) is kept aside as an orphan instead of
//! being promoted to a root.

use std::collections::{HashMap, HashSet};

use cp_core::traits::ChantierId;
use cp_models::Chantier;

use crate::sorts::{SortKey, SortOrder};

/// A flattened row for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchyRow<'a> {
    pub job: &'a Chantier,
    /// 0 for roots, 1 for children
    pub depth: u8,
}

#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    roots: Vec<Chantier>,
    children: HashMap<ChantierId, Vec<Chantier>>,
    orphans: Vec<Chantier>,
}

impl Hierarchy {
    pub fn build(jobs: &[Chantier]) -> Self {
        let order = SortOrder::asc(SortKey::StartDate);

        let mut roots: Vec<Chantier> = jobs.iter().filter(|j| !j.is_child()).cloned().collect();
        order.sort(&mut roots);

        let root_ids: HashSet<&str> = roots.iter().filter_map(|r| r.id.as_deref()).collect();

        let mut children: HashMap<ChantierId, Vec<Chantier>> = HashMap::new();
        let mut orphans = Vec::new();
        for job in jobs {
            let Some(parent_id) = job.parent_id() else {
                continue;
            };
            if root_ids.contains(parent_id) {
                children
                    .entry(parent_id.to_string())
                    .or_default()
                    .push(job.clone());
            } else {
                orphans.push(job.clone());
            }
        }
        for group in children.values_mut() {
            order.sort(group);
        }

        Self {
            roots,
            children,
            orphans,
        }
    }

    /// Jobs without a parent, by start date ascending
    pub fn roots(&self) -> &[Chantier] {
        &self.roots
    }

    /// Children of `id`, by start date ascending
    pub fn children_of(&self, id: &str) -> &[Chantier] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn children(&self) -> &HashMap<ChantierId, Vec<Chantier>> {
        &self.children
    }

    /// Children whose parent is not among the roots
    pub fn orphans(&self) -> &[Chantier] {
        &self.orphans
    }

    pub fn has_children(&self, id: &str) -> bool {
        !self.children_of(id).is_empty()
    }

    /// Roots, each followed by its children
    pub fn rows(&self) -> Vec<HierarchyRow<'_>> {
        let mut rows = Vec::with_capacity(self.len());
        for root in &self.roots {
            rows.push(HierarchyRow { job: root, depth: 0 });
            if let Some(id) = root.id.as_deref() {
                rows.extend(
                    self.children_of(id)
                        .iter()
                        .map(|child| HierarchyRow { job: child, depth: 1 }),
                );
            }
        }
        rows
    }

    /// Number of placed jobs (roots and attached children)
    pub fn len(&self) -> usize {
        self.roots.len() + self.children.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.children.is_empty()
    }
}

/// Ids to show for a search: every match, plus for a matched root all of
/// its children, plus for a matched child its parent and all siblings.
///
/// Relatives are looked up in `all`; a child whose parent is unknown brings
/// no relatives. Expansion runs once from the original matches only.
pub fn family_inclusion(all: &[Chantier], matches: &[Chantier]) -> HashSet<ChantierId> {
    let mut ids = HashSet::new();
    for job in matches {
        if let Some(id) = &job.id {
            ids.insert(id.clone());
        }
        match job.parent_id() {
            None => {
                if let Some(id) = job.id.as_deref() {
                    ids.extend(child_ids(all, id));
                }
            }
            Some(parent_id) => {
                let parent_known = all.iter().any(|p| p.id.as_deref() == Some(parent_id));
                if parent_known {
                    ids.insert(parent_id.to_string());
                    ids.extend(child_ids(all, parent_id));
                }
            }
        }
    }
    ids
}

fn child_ids<'a>(all: &'a [Chantier], parent: &'a str) -> impl Iterator<Item = ChantierId> + 'a {
    all.iter()
        .filter(move |c| c.parent_id() == Some(parent))
        .filter_map(|c| c.id.clone())
}
