//! The rendering environment a carousel drives.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use crate::markup::{Document, ElementId};

/// Operations a carousel needs from the environment hosting its container.
///
/// Slide indices passed in are always `< slide_count()`.
pub trait Stage {
    fn slide_count(&self) -> usize;
    fn container_width(&self) -> f32;
    fn slide_width(&self, index: usize) -> f32;
    fn set_visible(&mut self, index: usize, visible: bool);
    /// Horizontal position of one slide relative to the container.
    fn set_slide_offset(&mut self, index: usize, px: f32);
    fn set_container_offset(&mut self, px: f32);
    fn set_opacity(&mut self, index: usize, opacity: f32);
    /// Whether the environment recognises a style property such as `WebkitTransition`.
    fn supports_style(&self, property: &str) -> bool;
    /// Applies declarative transition styles to the container.
    fn apply_container_styles(&mut self, declarations: &[(String, String)]);
    fn clear_container_styles(&mut self, properties: &[String]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorPrefix {
    Moz,
    Webkit,
    Khtml,
    O,
    Ms,
}

impl VendorPrefix {
    /// Probe order.
    pub const ALL: &'static [Self] = &[Self::Moz, Self::Webkit, Self::Khtml, Self::O, Self::Ms];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moz => "Moz",
            Self::Webkit => "Webkit",
            Self::Khtml => "Khtml",
            Self::O => "O",
            Self::Ms => "ms",
        }
    }

    pub fn property(&self, name: &str) -> String {
        format!("{}{}", self.as_str(), name)
    }
}

impl fmt::Display for VendorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How slide transitions are executed, resolved once per carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSupport {
    Native(VendorPrefix),
    Manual,
}

impl TransitionSupport {
    pub fn detect<S: Stage + ?Sized>(stage: &S) -> Self {
        VendorPrefix::ALL
            .iter()
            .copied()
            .find(|prefix| stage.supports_style(&prefix.property("Transition")))
            .map_or(Self::Manual, Self::Native)
    }
}

/// Declarations for one native slide of the container.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSlide {
    pub prefix: VendorPrefix,
    pub distance_px: f32,
    pub duration: Duration,
}

impl NativeSlide {
    pub fn declarations(&self) -> Vec<(String, String)> {
        vec![
            (
                self.prefix.property("Transform"),
                format!("translate3d({}px,0,0)", self.distance_px),
            ),
            (
                self.prefix.property("TransitionDuration"),
                format!("{}ms", self.duration.as_millis()),
            ),
            (
                self.prefix.property("TransitionTimingFunction"),
                "ease".to_owned(),
            ),
        ]
    }

    pub fn properties(&self) -> Vec<String> {
        self.declarations()
            .into_iter()
            .map(|(property, _)| property)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideView {
    pub visible: bool,
    pub offset_px: f32,
    pub opacity: f32,
    pub width: f32,
}

/// In-memory stage that records what a renderer would show.
#[derive(Debug, Clone)]
pub struct HeadlessStage {
    width: f32,
    slides: Vec<SlideView>,
    container_offset_px: f32,
    container_styles: BTreeMap<String, String>,
    supported_styles: BTreeSet<String>,
}

impl HeadlessStage {
    /// A container of `width` holding `count` slides of the same width.
    pub fn new(width: f32, count: usize) -> Self {
        Self::with_slide_widths(width, vec![width; count])
    }

    pub fn with_slide_widths(width: f32, slide_widths: Vec<f32>) -> Self {
        let slides = slide_widths
            .into_iter()
            .map(|width| SlideView {
                visible: true,
                offset_px: 0.0,
                opacity: 1.0,
                width,
            })
            .collect();
        Self {
            width,
            slides,
            container_offset_px: 0.0,
            container_styles: BTreeMap::new(),
            supported_styles: BTreeSet::new(),
        }
    }

    /// Mirrors a markup container: one slide per immediate child.
    pub fn from_document(doc: &Document, container: ElementId, viewport_width: f32) -> Self {
        let width = doc.width_of(container, viewport_width);
        let slide_widths = doc
            .get(container)
            .map(|node| {
                node.children
                    .iter()
                    .map(|child| doc.width_of(*child, width))
                    .collect()
            })
            .unwrap_or_default();
        Self::with_slide_widths(width, slide_widths)
    }

    pub fn with_supported_styles<I, P>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.supported_styles = styles.into_iter().map(Into::into).collect();
        self
    }

    pub fn slide(&self, index: usize) -> Option<&SlideView> {
        self.slides.get(index)
    }

    pub fn visible_slides(&self) -> Vec<usize> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, slide)| slide.visible)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn container_offset(&self) -> f32 {
        self.container_offset_px
    }

    pub fn container_styles(&self) -> &BTreeMap<String, String> {
        &self.container_styles
    }
}

impl Stage for HeadlessStage {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn container_width(&self) -> f32 {
        self.width
    }

    fn slide_width(&self, index: usize) -> f32 {
        self.slides.get(index).map_or(self.width, |slide| slide.width)
    }

    fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(slide) = self.slides.get_mut(index) {
            slide.visible = visible;
        }
    }

    fn set_slide_offset(&mut self, index: usize, px: f32) {
        if let Some(slide) = self.slides.get_mut(index) {
            slide.offset_px = px;
        }
    }

    fn set_container_offset(&mut self, px: f32) {
        self.container_offset_px = px;
    }

    fn set_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(slide) = self.slides.get_mut(index) {
            slide.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn supports_style(&self, property: &str) -> bool {
        self.supported_styles.contains(property)
    }

    fn apply_container_styles(&mut self, declarations: &[(String, String)]) {
        for (property, value) in declarations {
            self.container_styles
                .insert(property.clone(), value.clone());
        }
    }

    fn clear_container_styles(&mut self, properties: &[String]) {
        for property in properties {
            self.container_styles.remove(property);
        }
    }
}
