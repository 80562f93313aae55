//! Notification grouping for reconciliation results

use std::fmt;

use crate::config::Settings;
use crate::engine::outcome::{DependencyOutcome, ResultSet};

/// How prominently a notification should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// At least one dependency is missing or installed outside its range
    Warning,
    /// Only upgrades are available
    Info,
}

/// A message ready to hand to the user-facing layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub severity: Severity,
    pub lines: Vec<String>,
}

impl Notification {
    pub fn detail(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        writeln!(f, "[{}] {}", label, self.title)?;
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Which category an outcome is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Unresolved,
    Outdated,
    Update,
}

/// Outcomes of one run grouped by display category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<'a> {
    entries: Vec<(Category, &'a DependencyOutcome)>,
}

impl<'a> Report<'a> {
    /// Group `results`, honoring the notify toggles in `settings`.
    /// Each outcome lands in its first matching category.
    pub fn from_results(results: &'a ResultSet, settings: &Settings) -> Self {
        let entries = results
            .iter()
            .filter_map(|outcome| {
                let category = if outcome.local_outdated {
                    Category::Unresolved
                } else if outcome.outdated && settings.notify_outdated {
                    Category::Outdated
                } else if outcome.outdated_not_wanted && settings.notify_update {
                    Category::Update
                } else {
                    return None;
                };
                Some((category, outcome))
            })
            .collect();

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &'a DependencyOutcome> + '_ {
        self.in_category(Category::Unresolved)
    }

    pub fn outdated(&self) -> impl Iterator<Item = &'a DependencyOutcome> + '_ {
        self.in_category(Category::Outdated)
    }

    pub fn updates(&self) -> impl Iterator<Item = &'a DependencyOutcome> + '_ {
        self.in_category(Category::Update)
    }

    fn in_category(&self, wanted: Category) -> impl Iterator<Item = &'a DependencyOutcome> + '_ {
        self.entries
            .iter()
            .filter(move |(category, _)| *category == wanted)
            .map(|(_, outcome)| *outcome)
    }

    /// Build the notification for this report, or `None` if nothing is worth reporting
    pub fn notification(&self, title: &str) -> Option<Notification> {
        if self.is_empty() {
            return None;
        }

        let lines = self
            .entries
            .iter()
            .map(|(category, outcome)| create_line(*category, outcome))
            .collect();

        let severity = if self.unresolved().next().is_some() {
            Severity::Warning
        } else {
            Severity::Info
        };

        Some(Notification {
            title: title.to_string(),
            severity,
            lines,
        })
    }
}

fn create_line(category: Category, outcome: &DependencyOutcome) -> String {
    let local = outcome.local_version.as_deref().unwrap_or("unknown");
    let remote = outcome.npm_version.as_deref().unwrap_or("unknown");

    match category {
        Category::Unresolved => format!("{} needs update", outcome.name),
        Category::Outdated => format!("{} outdated: {} => {}", outcome.name, local, remote),
        Category::Update => format!("{} updated: {} => {}", outcome.name, local, remote),
    }
}
