use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};
use tracing::debug;

use crate::error::Error;
use crate::markup::{
    Attributes, DATA_AUTOPLAY, DATA_AUTOPLAY_INTERVAL, DATA_SLIDER, DATA_TRANSITION_DURATION,
    ElementSpec, Selector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionEffect {
    #[default]
    Slide,
    Fade,
}

impl TransitionEffect {
    const ALL: &'static [Self] = &[Self::Slide, Self::Fade];
    const NAMES: &'static [&'static str] = &["slide", "fade"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slide => "slide",
            Self::Fade => "fade",
        }
    }

    fn from_name(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| raw == kind.as_str())
    }
}

impl fmt::Display for TransitionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransitionEffect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::from_name(&raw).ok_or_else(|| de::Error::unknown_variant(&raw, Self::NAMES))
    }
}

/// Per-carousel behaviour, fixed once the carousel is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CarouselConfig {
    /// Length of one slide or fade transition, in ms.
    pub transition_duration_ms: u64,
    pub transition_effect: TransitionEffect,
    /// Advance automatically every `autoplay-interval-ms`.
    pub autoplay: bool,
    pub autoplay_interval_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: Self::DEFAULT_TRANSITION_DURATION_MS,
            transition_effect: TransitionEffect::Slide,
            autoplay: true,
            autoplay_interval_ms: Self::DEFAULT_AUTOPLAY_INTERVAL_MS,
        }
    }
}

impl CarouselConfig {
    pub const DEFAULT_TRANSITION_DURATION_MS: u64 = 1000;
    pub const DEFAULT_AUTOPLAY_INTERVAL_MS: u64 = 4000;

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.transition_duration_ms > 0,
            "transition-duration-ms must be greater than zero"
        );
        ensure!(
            self.autoplay_interval_ms > 0,
            "autoplay-interval-ms must be greater than zero"
        );
        Ok(())
    }

    /// Applies the `data-slider-*` overrides of a container on top of `self`.
    ///
    /// Missing or unparsable attributes keep the value from `self`.
    pub fn with_overrides(&self, attributes: &Attributes) -> Self {
        let mut cfg = self.clone();
        if let Some(raw) = non_empty(attributes, DATA_SLIDER) {
            match TransitionEffect::from_name(raw) {
                Some(effect) => cfg.transition_effect = effect,
                None => debug!(value = raw, "ignoring unknown transition effect"),
            }
        }
        if let Some(ms) = positive_millis(attributes, DATA_TRANSITION_DURATION) {
            cfg.transition_duration_ms = ms;
        }
        if let Some(raw) = non_empty(attributes, DATA_AUTOPLAY) {
            match raw.parse::<bool>() {
                Ok(flag) => cfg.autoplay = flag,
                Err(_) => debug!(value = raw, "ignoring non-boolean autoplay flag"),
            }
        }
        if let Some(ms) = positive_millis(attributes, DATA_AUTOPLAY_INTERVAL) {
            cfg.autoplay_interval_ms = ms;
        }
        cfg
    }
}

fn non_empty<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn positive_millis(attributes: &Attributes, name: &str) -> Option<u64> {
    let raw = non_empty(attributes, name)?;
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Some(ms),
        _ => {
            debug!(attribute = name, value = raw, "ignoring invalid duration");
            None
        }
    }
}

/// Rendering environment simulated by the headless stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Style properties the environment reports as supported, e.g. `WebkitTransition`.
    pub supported_styles: Vec<String>,
    /// Animation frame period for manual animations.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
    /// Width of elements that declare none and have no sized ancestor.
    pub viewport_width: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            supported_styles: Vec::new(),
            frame_interval: Duration::from_millis(13),
            viewport_width: 1280.0,
        }
    }
}

/// A click replayed by the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScriptedClick {
    /// Offset from startup.
    #[serde(with = "humantime_serde")]
    pub after: Duration,
    /// Control(s) receiving the click.
    pub selector: String,
    /// Original target inside the control; defaults to the control itself.
    #[serde(default)]
    pub target: Option<String>,
}

/// Page description loaded by the `carousel` binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Options every discovered carousel starts from before markup overrides.
    pub defaults: CarouselConfig,
    pub environment: EnvironmentConfig,
    pub elements: Vec<ElementSpec>,
    pub clicks: Vec<ScriptedClick>,
    #[serde(with = "humantime_serde")]
    pub run_for: Option<Duration>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.defaults
            .validate()
            .context("invalid carousel defaults")?;
        ensure!(
            !self.environment.frame_interval.is_zero(),
            "environment.frame-interval must be greater than zero"
        );
        ensure!(
            self.environment.viewport_width.is_finite() && self.environment.viewport_width > 0.0,
            "environment.viewport-width must be positive"
        );
        for (index, click) in self.clicks.iter().enumerate() {
            click
                .selector
                .parse::<Selector>()
                .with_context(|| format!("clicks[{index}].selector"))?;
            if let Some(target) = &click.target {
                target
                    .parse::<Selector>()
                    .with_context(|| format!("clicks[{index}].target"))?;
            }
        }
        Ok(self)
    }
}
