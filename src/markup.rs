//! Declarative page markup: the element tree carousels are discovered in.
//!
//! A [`Document`] is an arena of [`Node`]s built from YAML [`ElementSpec`]s.
//! Carousel containers are marked with [`DATA_SLIDER`]; controls and slide
//! index targets are described with the other `data-slider-*` attributes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::actions::{self, ActionBinding};
use crate::config::CarouselConfig;
use crate::error::Error;

/// Marks a carousel container; its value selects the transition effect.
pub const DATA_SLIDER: &str = "data-slider";
pub const DATA_TRANSITION_DURATION: &str = "data-slider-transition-duration";
pub const DATA_AUTOPLAY: &str = "data-slider-autoplay";
pub const DATA_AUTOPLAY_INTERVAL: &str = "data-slider-autoplay-interval";
/// Comma-separated selectors of the container's actionable controls.
pub const DATA_ACTIONS: &str = "data-slider-actions";
/// Action name declared by a control (`next`, `previous`, `gotoSlide`).
pub const DATA_ACTION: &str = "data-slider-action";
/// Slide index targeted by a `gotoSlide` control.
pub const DATA_SLIDE_INDEX: &str = "data-slider-slide-index";

pub type Attributes = BTreeMap<String, String>;

/// Markup element as written in a page description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ElementSpec {
    pub id: Option<String>,
    /// Space separated class list.
    pub class: String,
    pub attributes: Attributes,
    /// Rendered outer width in pixels, inherited from the parent when unset.
    pub width: Option<f32>,
    pub children: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Attributes,
    pub width: Option<f32>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => self.classes.iter().any(|c| c == class),
        }
    }
}

/// The selector subset understood by actionable lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let valid_name = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if let Some(id) = trimmed.strip_prefix('#').filter(|id| valid_name(id)) {
            return Ok(Self::Id(id.to_owned()));
        }
        if let Some(class) = trimmed.strip_prefix('.').filter(|class| valid_name(class)) {
            return Ok(Self::Class(class.to_owned()));
        }
        Err(Error::InvalidSelector(raw.to_owned()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Class(class) => write!(f, ".{class}"),
        }
    }
}

/// A carousel discovered through [`DATA_SLIDER`], ready to be constructed.
#[derive(Debug, Clone)]
pub struct Mount {
    pub container: ElementId,
    pub config: CarouselConfig,
    pub bindings: Vec<ActionBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn from_specs(specs: &[ElementSpec]) -> Self {
        let mut doc = Self::default();
        for spec in specs {
            doc.insert(spec, None);
        }
        doc
    }

    fn insert(&mut self, spec: &ElementSpec, parent: Option<ElementId>) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            id: spec.id.clone(),
            classes: spec.class.split_whitespace().map(str::to_owned).collect(),
            attributes: spec.attributes.clone(),
            width: spec.width,
            parent,
            children: Vec::with_capacity(spec.children.len()),
        });
        for child in &spec.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element ids in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (ElementId(index), node))
    }

    pub fn select(&self, selector: &Selector) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, node)| node.matches(selector))
            .map(|(id, _)| id)
            .collect()
    }

    /// Parses and resolves a single selector; unparsable input matches nothing.
    pub fn query(&self, raw: &str) -> Vec<ElementId> {
        match raw.parse::<Selector>() {
            Ok(selector) => self.select(&selector),
            Err(err) => {
                debug!(error = %err, "selector skipped");
                Vec::new()
            }
        }
    }

    /// Outer width of an element, walking up to the nearest sized ancestor.
    pub fn width_of(&self, id: ElementId, fallback: f32) -> f32 {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.get(current) else {
                break;
            };
            if let Some(width) = node.width {
                return width;
            }
            cursor = node.parent;
        }
        fallback
    }

    /// Finds every [`DATA_SLIDER`] container and resolves its config and bindings.
    pub fn auto_mounts(&self, defaults: &CarouselConfig) -> Vec<Mount> {
        self.iter()
            .filter(|(_, node)| node.attributes.contains_key(DATA_SLIDER))
            .map(|(container, node)| {
                let config = defaults.with_overrides(&node.attributes);
                let bindings = actions::bind_actionables(self, container);
                debug!(
                    container = ?node.id,
                    slides = node.children.len(),
                    bindings = bindings.len(),
                    effect = %config.transition_effect,
                    "carousel_discovered"
                );
                Mount {
                    container,
                    config,
                    bindings,
                }
            })
            .collect()
    }
}
