//! Actionable controls: page elements that drive a carousel when clicked.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::Error;
use crate::markup::{DATA_ACTION, DATA_ACTIONS, DATA_SLIDE_INDEX, Document, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    GotoSlide,
}

impl Action {
    const ALL: &'static [Self] = &[Self::Next, Self::Previous, Self::GotoSlide];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::GotoSlide => "gotoSlide",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == raw)
            .ok_or_else(|| Error::UnknownAction(raw.to_owned()))
    }
}

/// A control element wired to one carousel action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub control: ElementId,
    pub action: Action,
}

/// A click on a bound control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub control: ElementId,
    /// Raw [`DATA_SLIDE_INDEX`] of the element that originally received the click.
    pub target_slide_index: Option<String>,
}

impl ClickEvent {
    /// A click whose original target is the control itself.
    pub fn on(doc: &Document, control: ElementId) -> Self {
        Self::with_target(doc, control, control)
    }

    pub fn with_target(doc: &Document, control: ElementId, target: ElementId) -> Self {
        let target_slide_index = doc
            .get(target)
            .and_then(|node| node.attribute(DATA_SLIDE_INDEX))
            .map(str::to_owned);
        Self {
            control,
            target_slide_index,
        }
    }

    /// Slide index declared by the original target, if it is a non-negative integer.
    pub fn slide_index(&self) -> Option<usize> {
        self.target_slide_index
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
    }
}

/// Resolves the container's [`DATA_ACTIONS`] list into bindings.
///
/// Selectors that do not parse, elements without a [`DATA_ACTION`] and
/// unknown action names are skipped.
pub fn bind_actionables(doc: &Document, container: ElementId) -> Vec<ActionBinding> {
    let Some(list) = doc
        .get(container)
        .and_then(|node| node.attribute(DATA_ACTIONS))
    else {
        return Vec::new();
    };

    let mut bindings = Vec::new();
    for raw in list.split(',').filter(|raw| !raw.trim().is_empty()) {
        for control in doc.query(raw) {
            let Some(declared) = doc
                .get(control)
                .and_then(|node| node.attribute(DATA_ACTION))
                .filter(|name| !name.trim().is_empty())
            else {
                debug!(selector = raw.trim(), "actionable without an action");
                continue;
            };
            match declared.parse::<Action>() {
                Ok(action) => bindings.push(ActionBinding { control, action }),
                Err(err) => debug!(selector = raw.trim(), error = %err, "actionable skipped"),
            }
        }
    }
    bindings
}
