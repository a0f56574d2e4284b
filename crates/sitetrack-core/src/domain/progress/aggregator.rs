//! Quantity roll-up
//!
//! Recomputes completed/total/progress for every subpackage, package and
//! the project from the task level upward. Tasks are authoritative. A
//! container without children keeps the quantities it was given explicitly
//! and only has its progress refreshed.

use tracing::debug;

use super::{Quantities, progress_percent};
use crate::domain::wbs::{Package, Project, Subpackage};
use crate::error::{Error, Result};

/// Running sum carried up the post-order walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    completed: i64,
    total: i64,
}

impl Tally {
    /// Add a child's quantities, failing on overflow
    fn add(&mut self, owner: &str, item: &impl Quantities) -> Result<()> {
        match (
            self.completed.checked_add(item.completed()),
            self.total.checked_add(item.total()),
        ) {
            (Some(completed), Some(total)) => {
                self.completed = completed;
                self.total = total;
                Ok(())
            }
            _ => Err(Error::validation(format!(
                "quantities under '{}' exceed {}",
                owner,
                i64::MAX
            ))),
        }
    }
}

/// Bottom-up aggregation of quantities
pub struct QuantityAggregator;

impl QuantityAggregator {
    /// Roll quantities up through the whole project
    ///
    /// Pure: the input is consumed and a new value returned. Running it on
    /// an already aggregated project returns an identical project. Sums that
    /// do not fit in an `i64` are a validation error.
    pub fn run(mut project: Project) -> Result<Project> {
        let mut project_tally = Tally::default();

        for package in &mut project.packages {
            Self::roll_up_package(package)?;
            project_tally.add(&project.name, &*package)?;
        }

        if !project.packages.is_empty() {
            project.completed = project_tally.completed;
            project.total = project_tally.total;
        }
        project.progress = progress_percent(project.completed, project.total);

        debug!(
            project_id = %project.id,
            completed = project.completed,
            total = project.total,
            progress = project.progress,
            "Quantities rolled up"
        );

        Ok(project)
    }

    fn roll_up_package(package: &mut Package) -> Result<()> {
        let mut tally = Tally::default();
        for subpackage in &mut package.subpackages {
            Self::roll_up_subpackage(subpackage)?;
            tally.add(&package.name, &*subpackage)?;
        }

        if !package.subpackages.is_empty() {
            package.completed = tally.completed;
            package.total = tally.total;
        }
        package.progress = progress_percent(package.completed, package.total);
        Ok(())
    }

    fn roll_up_subpackage(subpackage: &mut Subpackage) -> Result<()> {
        let mut tally = Tally::default();
        for task in &mut subpackage.tasks {
            task.progress = progress_percent(task.completed, task.total);
            tally.add(&subpackage.name, &*task)?;
        }

        if !subpackage.tasks.is_empty() {
            subpackage.completed = tally.completed;
            subpackage.total = tally.total;
        }
        subpackage.progress = progress_percent(subpackage.completed, subpackage.total);
        Ok(())
    }

    /// Verify the roll-up and range invariants at every level
    ///
    /// Returns the first violation found, walking in display order.
    pub fn check(project: &Project) -> Result<()> {
        check_range(&project.name, project)?;

        if !project.packages.is_empty() {
            check_sum(&project.name, project, project.packages.iter())?;
        }

        for package in &project.packages {
            check_range(&package.name, package)?;
            if !package.subpackages.is_empty() {
                check_sum(&package.name, package, package.subpackages.iter())?;
            }

            for subpackage in &package.subpackages {
                check_range(&subpackage.name, subpackage)?;
                if !subpackage.tasks.is_empty() {
                    check_sum(&subpackage.name, subpackage, subpackage.tasks.iter())?;
                }
                for task in &subpackage.tasks {
                    check_range(&task.name, task)?;
                }
            }
        }

        Ok(())
    }
}

fn check_range(name: &str, item: &impl Quantities) -> Result<()> {
    if item.completed() < 0 || item.total() < 0 || item.completed() > item.total() {
        return Err(Error::validation(format!(
            "'{}' has completed {} outside 0..={}",
            name,
            item.completed(),
            item.total()
        )));
    }
    if item.progress() != progress_percent(item.completed(), item.total()) {
        return Err(Error::validation(format!(
            "'{}' reports progress {}% for {}/{}",
            name,
            item.progress(),
            item.completed(),
            item.total()
        )));
    }
    Ok(())
}

fn check_sum<'a, Q: Quantities + 'a>(
    name: &str,
    parent: &impl Quantities,
    children: impl Iterator<Item = &'a Q>,
) -> Result<()> {
    let mut tally = Tally::default();
    for child in children {
        tally.add(name, child)?;
    }
    if tally.completed != parent.completed() || tally.total != parent.total() {
        return Err(Error::validation(format!(
            "'{}' holds {}/{} but its children sum to {}/{}",
            name,
            parent.completed(),
            parent.total(),
            tally.completed,
            tally.total
        )));
    }
    Ok(())
}
