//! Quantity distribution
//!
//! Splits a parent quantity across the children of a package or subpackage.
//! Every strategy allocates exactly `parent_total` units: nothing is dropped
//! and nothing is invented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::progress_percent;
use crate::domain::wbs::{NodePath, Project, Subpackage, find_package, find_subpackage};
use crate::error::{Error, Result};

/// How a parent quantity is split across children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Same share for everyone; the remainder goes to the first children
    #[default]
    Equal,
    /// Shares follow the children's current totals
    Proportional,
    /// Caller supplies every allocation
    Manual,
}

impl DistributionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Proportional => "proportional",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for DistributionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DistributionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "proportional" => Ok(Self::Proportional),
            "manual" => Ok(Self::Manual),
            other => Err(Error::validation(format!(
                "unknown distribution strategy '{}' (expected equal, proportional or manual)",
                other
            ))),
        }
    }
}

/// Share assigned to one child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Position of the child under the parent
    pub index: usize,
    pub name: String,
    pub allocated: i64,
    /// Completed units to record; the child's current value when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<i64>,
}

impl Allocation {
    pub fn new(index: usize, name: impl Into<String>, allocated: i64) -> Self {
        Self {
            index,
            name: name.into(),
            allocated,
            completed: None,
        }
    }

    pub fn with_completed(mut self, completed: i64) -> Self {
        self.completed = Some(completed);
        self
    }
}

/// Boundary shape of a distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    pub parent_total: i64,
    pub distributions: Vec<Allocation>,
}

impl DistributionRequest {
    pub fn new(parent_total: i64, distributions: Vec<Allocation>) -> Self {
        Self {
            parent_total,
            distributions,
        }
    }

    /// Allocated amounts in child order
    pub fn amounts(&self) -> Vec<i64> {
        let mut sorted: Vec<&Allocation> = self.distributions.iter().collect();
        sorted.sort_by_key(|a| a.index);
        sorted.into_iter().map(|a| a.allocated).collect()
    }

    pub fn allocated_sum(&self) -> i128 {
        self.distributions.iter().map(|a| i128::from(a.allocated)).sum()
    }
}

/// Snapshot of a child's current quantities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildQuantity {
    pub index: usize,
    pub name: String,
    pub completed: i64,
    pub total: i64,
}

/// Splits parent quantities across children
pub struct QuantityDistributor;

impl QuantityDistributor {
    /// `parent_total / count` each, the first `parent_total % count` get one more
    pub fn equal_split(parent_total: i64, count: usize) -> Result<Vec<i64>> {
        if parent_total < 0 {
            return Err(Error::validation(format!(
                "parent total must not be negative (got {})",
                parent_total
            )));
        }
        if count == 0 {
            return if parent_total == 0 {
                Ok(Vec::new())
            } else {
                Err(Error::validation(format!(
                    "cannot distribute {} units across zero children",
                    parent_total
                )))
            };
        }

        let count_i = count as i64;
        let base = parent_total / count_i;
        let remainder = (parent_total % count_i) as usize;

        Ok((0..count)
            .map(|i| if i < remainder { base + 1 } else { base })
            .collect())
    }

    /// Largest-remainder split against `weights`
    ///
    /// Floor shares first; leftover units go to the largest fractional
    /// remainders, ties to the lower index. All-zero weights fall back to an
    /// equal split.
    pub fn proportional_split(parent_total: i64, weights: &[i64]) -> Result<Vec<i64>> {
        if parent_total < 0 {
            return Err(Error::validation(format!(
                "parent total must not be negative (got {})",
                parent_total
            )));
        }
        if let Some(w) = weights.iter().find(|w| **w < 0) {
            return Err(Error::validation(format!("weight {} is negative", w)));
        }

        let weight_sum: i128 = weights.iter().map(|w| i128::from(*w)).sum();
        if weight_sum == 0 {
            return Self::equal_split(parent_total, weights.len());
        }

        let total = i128::from(parent_total);
        let mut shares: Vec<i128> = Vec::with_capacity(weights.len());
        let mut remainders: Vec<(i128, usize)> = Vec::with_capacity(weights.len());
        for (i, w) in weights.iter().enumerate() {
            let scaled = total * i128::from(*w);
            shares.push(scaled / weight_sum);
            remainders.push((scaled % weight_sum, i));
        }

        let leftover = (total - shares.iter().sum::<i128>()) as usize;
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for &(_, i) in remainders.iter().take(leftover) {
            shares[i] += 1;
        }

        Ok(shares.into_iter().map(|s| s as i64).collect())
    }

    /// Current quantities of the children of a package or subpackage
    pub fn children_of(project: &Project, target: &NodePath) -> Result<Vec<ChildQuantity>> {
        match *target {
            NodePath::Package { package } => Ok(find_package(project, package)?
                .subpackages
                .iter()
                .enumerate()
                .map(|(index, s)| ChildQuantity {
                    index,
                    name: s.name.clone(),
                    completed: s.completed,
                    total: s.total,
                })
                .collect()),
            NodePath::Subpackage {
                package,
                subpackage,
            } => Ok(find_subpackage(project, package, subpackage)?
                .tasks
                .iter()
                .enumerate()
                .map(|(index, t)| ChildQuantity {
                    index,
                    name: t.name.clone(),
                    completed: t.completed,
                    total: t.total,
                })
                .collect()),
            other => Err(Error::validation(format!(
                "distribution target must be a package or subpackage, got a {}",
                other.node_type()
            ))),
        }
    }

    /// Compute allocations for the equal or proportional strategy
    pub fn plan(
        strategy: DistributionStrategy,
        parent_total: i64,
        children: &[ChildQuantity],
    ) -> Result<DistributionRequest> {
        let amounts = match strategy {
            DistributionStrategy::Equal => Self::equal_split(parent_total, children.len())?,
            DistributionStrategy::Proportional => {
                let weights: Vec<i64> = children.iter().map(|c| c.total).collect();
                Self::proportional_split(parent_total, &weights)?
            }
            DistributionStrategy::Manual => {
                return Err(Error::validation(
                    "manual distribution needs explicit allocations",
                ));
            }
        };

        let request = DistributionRequest::new(
            parent_total,
            children
                .iter()
                .zip(amounts)
                .map(|(child, allocated)| {
                    Allocation::new(child.index, child.name.clone(), allocated)
                        .with_completed(child.completed)
                })
                .collect(),
        );
        Self::validate(&request, children)?;
        Ok(request)
    }

    /// Produce a validated distribution under any strategy
    ///
    /// `manual` is required for the manual strategy and ignored otherwise.
    pub fn distribute(
        strategy: DistributionStrategy,
        parent_total: i64,
        children: &[ChildQuantity],
        manual: Option<Vec<Allocation>>,
    ) -> Result<DistributionRequest> {
        let request = match strategy {
            DistributionStrategy::Manual => {
                let allocations = manual.ok_or_else(|| {
                    Error::validation("manual distribution needs explicit allocations")
                })?;
                let request = DistributionRequest::new(parent_total, allocations);
                Self::validate(&request, children)?;
                request
            }
            other => Self::plan(other, parent_total, children)?,
        };

        debug!(
            strategy = %strategy,
            parent_total = parent_total,
            children = children.len(),
            "Distribution computed"
        );
        Ok(request)
    }

    /// Check a request against the children it targets
    pub fn validate(request: &DistributionRequest, children: &[ChildQuantity]) -> Result<()> {
        if request.parent_total < 0 {
            return Err(Error::validation(format!(
                "parent total must not be negative (got {})",
                request.parent_total
            )));
        }
        if children.is_empty() && request.parent_total > 0 {
            return Err(Error::validation(format!(
                "cannot distribute {} units across zero children",
                request.parent_total
            )));
        }
        if request.distributions.len() != children.len() {
            return Err(Error::validation(format!(
                "expected one allocation per child ({}), got {}",
                children.len(),
                request.distributions.len()
            )));
        }

        let mut seen = vec![false; children.len()];
        for allocation in &request.distributions {
            let child = children.get(allocation.index).ok_or_else(|| {
                Error::validation(format!(
                    "allocation index {} is out of range (0..{})",
                    allocation.index,
                    children.len()
                ))
            })?;
            if std::mem::replace(&mut seen[allocation.index], true) {
                return Err(Error::validation(format!(
                    "child {} is allocated more than once",
                    allocation.index
                )));
            }
            if allocation.allocated < 0 {
                return Err(Error::validation(format!(
                    "allocation for '{}' is negative ({})",
                    child.name, allocation.allocated
                )));
            }
            let completed = allocation.completed.unwrap_or(child.completed);
            if completed < 0 {
                return Err(Error::validation(format!(
                    "completed for '{}' is negative ({})",
                    child.name, completed
                )));
            }
            if completed > allocation.allocated {
                return Err(Error::validation(format!(
                    "'{}' has completed {} which exceeds its allocation of {}",
                    child.name, completed, allocation.allocated
                )));
            }
        }

        let sum = request.allocated_sum();
        if sum != i128::from(request.parent_total) {
            return Err(Error::validation(format!(
                "allocations sum to {} but the parent total is {}",
                sum, request.parent_total
            )));
        }

        Ok(())
    }

    /// Write a validated distribution into a new project value
    ///
    /// The result is not aggregated; run `QuantityAggregator::run` on it to
    /// refresh ancestors. A subpackage that owns tasks passes its allocation
    /// down to them so the roll-up reproduces it exactly: each task keeps its
    /// completed units and the remainder is split by open work.
    pub fn apply(project: &Project, target: &NodePath, request: &DistributionRequest) -> Result<Project> {
        let children = Self::children_of(project, target)?;
        Self::validate(request, &children)?;

        let mut next = project.clone();
        match *target {
            NodePath::Package { package } => {
                let subpackages = &mut next.packages[package].subpackages;
                for allocation in &request.distributions {
                    let child = &children[allocation.index];
                    apply_to_subpackage(&mut subpackages[allocation.index], child, allocation)?;
                }
            }
            NodePath::Subpackage {
                package,
                subpackage,
            } => {
                let tasks = &mut next.packages[package].subpackages[subpackage].tasks;
                for allocation in &request.distributions {
                    let task = &mut tasks[allocation.index];
                    task.total = allocation.allocated;
                    task.completed = allocation.completed.unwrap_or(task.completed);
                    task.progress = progress_percent(task.completed, task.total);
                }
            }
            _ => unreachable!("children_of only accepts packages and subpackages"),
        }

        Ok(next)
    }
}

fn apply_to_subpackage(
    subpackage: &mut Subpackage,
    current: &ChildQuantity,
    allocation: &Allocation,
) -> Result<()> {
    if subpackage.tasks.is_empty() {
        subpackage.total = allocation.allocated;
        subpackage.completed = allocation.completed.unwrap_or(subpackage.completed);
        subpackage.progress = progress_percent(subpackage.completed, subpackage.total);
        return Ok(());
    }

    if let Some(completed) = allocation.completed {
        if completed != current.completed {
            return Err(Error::validation(format!(
                "'{}' derives its completed units from its tasks ({}); got {}",
                subpackage.name, current.completed, completed
            )));
        }
    }

    // Completed units stay where they are; the rest follows remaining work
    let completed: i128 = subpackage.tasks.iter().map(|t| i128::from(t.completed)).sum();
    let open = i128::from(allocation.allocated) - completed;
    if open < 0 {
        return Err(Error::validation(format!(
            "'{}' has completed {} which exceeds its allocation of {}",
            subpackage.name, completed, allocation.allocated
        )));
    }

    let weights: Vec<i64> = subpackage
        .tasks
        .iter()
        .map(|t| (t.total - t.completed).max(0))
        .collect();
    let shares = QuantityDistributor::proportional_split(open as i64, &weights)?;
    for (task, share) in subpackage.tasks.iter_mut().zip(shares) {
        task.total = task.completed + share;
        task.progress = progress_percent(task.completed, task.total);
    }
    Ok(())
}
