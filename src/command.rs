//! The interactive "arrange labels" command.
//!
//! Picking and choosing happen before any mutation, so cancelling at any
//! prompt leaves the document exactly as it was.

use std::fmt;

use tracing::{info, warn};

use crate::arrange::{ArrangeReport, arrange};
use crate::config::Config;
use crate::document::DocumentStore;
use crate::layout::Point;
use crate::model::{LabelId, LeaderStyle, SortAxis};

pub const PICK_LABELS_PROMPT: &str = "Select the labels to arrange";
pub const PICK_ORIGIN_PROMPT: &str = "Pick the point where the labels start";
pub const AXIS_TITLE: &str = "Arrangement direction";
pub const AXIS_OPTIONS: [&str; 2] = ["Horizontal (left to right)", "Vertical (top to bottom)"];
pub const LEADER_TITLE: &str = "Leader style";
pub const LEADER_OPTIONS: [&str; 2] = ["Straight", "L-shaped"];

/// Interactive picking. `None` means the user cancelled.
pub trait SelectionService {
    fn pick_labels(&mut self, prompt: &str) -> Option<Vec<LabelId>>;

    fn pick_point(&mut self, prompt: &str) -> Option<Point>;
}

/// A small enumerated choice. Returns the chosen index, `None` on cancel.
pub trait ConfirmationService {
    fn choose(&mut self, title: &str, options: &[&str]) -> Option<usize>;
}

#[derive(Debug)]
pub enum CommandOutcome {
    Succeeded(ArrangeReport),
    Failed(String),
    Cancelled,
}

impl CommandOutcome {
    pub fn placed(&self) -> Option<usize> {
        match self {
            Self::Succeeded(report) => Some(report.placed()),
            _ => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded(report) => {
                write!(f, "arranged {} label(s)", report.placed())?;
                let skipped = report.skipped().count();
                if skipped > 0 {
                    write!(f, ", {skipped} skipped")?;
                }
                Ok(())
            }
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Labels in `ids` that are missing from the store or tag nothing.
pub fn invalid_selection<S: DocumentStore + ?Sized>(store: &S, ids: &[LabelId]) -> Vec<LabelId> {
    ids.iter()
        .copied()
        .filter(|id| {
            store
                .label(*id)
                .is_none_or(|label| label.primary_element().is_none())
        })
        .collect()
}

/// Run the full command: pick labels, choose axis and leader style, pick the
/// origin, then arrange.
pub fn run_arrange_command<S, P, C>(
    store: &mut S,
    selection: &mut P,
    confirmation: &mut C,
    config: &Config,
) -> CommandOutcome
where
    S: DocumentStore + ?Sized,
    P: SelectionService + ?Sized,
    C: ConfirmationService + ?Sized,
{
    info!("arrange command started");
    let outcome = run_steps(store, selection, confirmation, config);
    match &outcome {
        CommandOutcome::Succeeded(report) => {
            info!(outcome = "success", placed = report.placed(), "arrange command finished")
        }
        CommandOutcome::Failed(reason) => warn!(%reason, "arrange command failed"),
        CommandOutcome::Cancelled => info!("arrange command cancelled"),
    }
    outcome
}

fn run_steps<S, P, C>(
    store: &mut S,
    selection: &mut P,
    confirmation: &mut C,
    config: &Config,
) -> CommandOutcome
where
    S: DocumentStore + ?Sized,
    P: SelectionService + ?Sized,
    C: ConfirmationService + ?Sized,
{
    let Some(ids) = selection.pick_labels(PICK_LABELS_PROMPT) else {
        return CommandOutcome::Cancelled;
    };
    if ids.is_empty() {
        return CommandOutcome::Cancelled;
    }
    let invalid = invalid_selection(&*store, &ids);
    if !invalid.is_empty() {
        let list: Vec<String> = invalid.iter().map(ToString::to_string).collect();
        return CommandOutcome::Failed(format!(
            "selection contains invalid labels: {}",
            list.join(", ")
        ));
    }

    let mut config = config.clone();
    let Some(axis) = confirmation.choose(AXIS_TITLE, &AXIS_OPTIONS) else {
        return CommandOutcome::Cancelled;
    };
    config.select_axis(if axis == 0 {
        SortAxis::Horizontal
    } else {
        SortAxis::Vertical
    });
    let Some(style) = confirmation.choose(LEADER_TITLE, &LEADER_OPTIONS) else {
        return CommandOutcome::Cancelled;
    };
    config.placement.leader_style = if style == 0 {
        LeaderStyle::Straight
    } else {
        LeaderStyle::LShape
    };

    let Some(origin) = selection.pick_point(PICK_ORIGIN_PROMPT) else {
        return CommandOutcome::Cancelled;
    };

    match arrange(store, &ids, Some(origin), &config.placement) {
        Ok(report) => CommandOutcome::Succeeded(report),
        Err(err) => CommandOutcome::Failed(err.to_string()),
    }
}

/// Answers picked up front, e.g. from command-line flags. Missing answers
/// behave like a cancelled prompt.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    pub labels: Option<Vec<LabelId>>,
    pub origin: Option<Point>,
    pub choices: Vec<usize>,
}

impl SelectionService for Scripted {
    fn pick_labels(&mut self, _prompt: &str) -> Option<Vec<LabelId>> {
        self.labels.clone()
    }

    fn pick_point(&mut self, _prompt: &str) -> Option<Point> {
        self.origin
    }
}

impl ConfirmationService for Scripted {
    fn choose(&mut self, _title: &str, options: &[&str]) -> Option<usize> {
        if self.choices.is_empty() {
            return None;
        }
        let choice = self.choices.remove(0);
        (choice < options.len()).then_some(choice)
    }
}
