//! Carousel controller.
//!
//! A [`Carousel`] owns one container's slides (through its [`Stage`]), the
//! active slide index, the in-flight transition and the autoplay timer.
//! It never blocks: transitions advance on [`Carousel::on_frame`] and
//! finish on the last frame or on [`Carousel::transition_end`], and autoplay
//! expiries arrive through [`Carousel::handle`].

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::actions::{Action, ActionBinding, ClickEvent};
use crate::animation::{Easing, Tween};
use crate::config::{CarouselConfig, TransitionEffect};
use crate::events::{
    CarouselEvent, Command, Direction, GotoTarget, SlideChanged, TransitionId, TransitionRequest,
};
use crate::schedule::{ManualScheduler, Scheduler, TimerId};
use crate::stage::{NativeSlide, Stage, TransitionSupport};

#[derive(Debug)]
enum EffectState {
    /// Declarations applied; waiting for the environment to finish.
    NativeSlide {
        slide: NativeSlide,
        started_at: Instant,
    },
    ManualSlide(Tween),
    Fade {
        fade_in: Tween,
        fade_out: Tween,
        fade_in_done: bool,
        fade_out_done: bool,
    },
}

#[derive(Debug)]
struct ActiveTransition {
    id: TransitionId,
    from: usize,
    to: usize,
    effect: EffectState,
}

pub struct Carousel<S, T> {
    stage: S,
    config: CarouselConfig,
    scheduler: T,
    support: TransitionSupport,
    bindings: Vec<ActionBinding>,
    active: usize,
    transition: Option<ActiveTransition>,
    transitions: u64,
    autoplay: Option<TimerId>,
    staged: bool,
}

impl<S: Stage, T: Scheduler> Carousel<S, T> {
    /// Stages the slides and, when configured, starts autoplay.
    ///
    /// With fewer than two slides the carousel stays passive: nothing is
    /// hidden, bindings are dropped and every operation is a no-op.
    pub fn new(
        mut stage: S,
        config: CarouselConfig,
        bindings: Vec<ActionBinding>,
        scheduler: T,
        now: Instant,
    ) -> Self {
        let count = stage.slide_count();
        let staged = count > 1;
        if staged {
            for index in 1..count {
                stage.set_visible(index, false);
            }
        }
        let support = TransitionSupport::detect(&stage);
        debug!(
            slides = count,
            staged,
            support = ?support,
            effect = %config.transition_effect,
            autoplay = config.autoplay,
            "carousel_init"
        );

        let mut carousel = Self {
            stage,
            config,
            scheduler,
            support,
            bindings: if staged { bindings } else { Vec::new() },
            active: 0,
            transition: None,
            transitions: 0,
            autoplay: None,
            staged,
        };
        if carousel.staged && carousel.config.autoplay {
            carousel.play(now);
        }
        carousel
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn slide_count(&self) -> usize {
        self.stage.slide_count()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Id of the in-flight transition; hosts tag transition-end
    /// notifications with it.
    pub fn transition_id(&self) -> Option<TransitionId> {
        self.transition.as_ref().map(|transition| transition.id)
    }

    /// Whether an autoplay timer is currently armed.
    pub fn is_playing(&self) -> bool {
        self.autoplay.is_some()
    }

    pub fn is_staged(&self) -> bool {
        self.staged
    }

    pub fn support(&self) -> TransitionSupport {
        self.support
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn bindings(&self) -> &[ActionBinding] {
        &self.bindings
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn next(&mut self, now: Instant) {
        if !self.staged {
            return;
        }
        let to = (self.active + 1) % self.slide_count();
        self.navigate(
            TransitionRequest {
                to,
                direction: Direction::Forward,
                speed: None,
            },
            now,
        );
    }

    pub fn previous(&mut self, now: Instant) {
        if !self.staged {
            return;
        }
        let count = self.slide_count();
        let to = (self.active + count - 1) % count;
        self.navigate(
            TransitionRequest {
                to,
                direction: Direction::Backward,
                speed: None,
            },
            now,
        );
    }

    /// Jumps to an interior slide.
    ///
    /// Only `0 < index < count - 1` is accepted; the first and last slide are
    /// reachable through `next`/`previous` only. A click resolves its index
    /// from the original target's slide-index attribute.
    pub fn goto_slide(&mut self, target: impl Into<GotoTarget>, now: Instant) {
        let index = match target.into() {
            GotoTarget::Index(index) => index,
            GotoTarget::Click(click) => match click.slide_index() {
                Some(index) => index,
                None => {
                    debug!(raw = ?click.target_slide_index, "goto without a slide index");
                    return;
                }
            },
        };
        if !self.staged || index == 0 || index >= self.slide_count() - 1 {
            debug!(index, count = self.slide_count(), "goto index out of range");
            return;
        }
        let direction = if index > self.active {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.navigate(
            TransitionRequest {
                to: index,
                direction,
                speed: None,
            },
            now,
        );
    }

    /// Re-arms the autoplay timer when autoplay is enabled.
    pub fn play(&mut self, now: Instant) {
        self.pause();
        if self.autoplay.is_none() && self.config.autoplay && self.staged {
            let id = self
                .scheduler
                .schedule(self.config.autoplay_interval(), now);
            trace!(?id, "autoplay_armed");
            self.autoplay = Some(id);
        }
    }

    pub fn pause(&mut self) {
        if let Some(id) = self.autoplay.take() {
            self.scheduler.cancel(id);
            trace!(?id, "autoplay_cancelled");
        }
    }

    /// Runs one transition towards `request.to`.
    ///
    /// Dropped while another transition is in flight. Autoplay is paused
    /// first and re-armed afterwards either way.
    pub fn navigate(&mut self, request: TransitionRequest, now: Instant) {
        if !self.staged || request.to >= self.slide_count() {
            return;
        }
        self.pause();
        if self.transition.is_some() {
            debug!(to = request.to, "navigation dropped while animating");
        } else if request.to == self.active {
            debug!(to = request.to, "navigation to the active slide ignored");
        } else {
            self.begin(request, now);
        }
        if self.config.autoplay {
            self.play(now);
        }
    }

    fn begin(&mut self, request: TransitionRequest, now: Instant) {
        let from = self.active;
        let to = request.to;
        let effect = self.config.transition_effect;
        let duration = request
            .speed
            .unwrap_or_else(|| self.config.transition_duration());

        if effect == TransitionEffect::Slide {
            let offset = request.direction.sign() * self.stage.container_width() * -1.0;
            self.stage.set_slide_offset(to, offset);
            self.stage.set_visible(to, true);
        }

        let state = match effect {
            TransitionEffect::Slide => self.dispatch_slide(to, request.direction, duration, now),
            TransitionEffect::Fade => self.dispatch_fade(to, duration, now),
        };
        self.transitions += 1;
        let id = TransitionId(self.transitions);
        debug!(
            id = id.0,
            from,
            to,
            effect = %effect,
            duration_ms = duration.as_millis() as u64,
            "transition_start"
        );
        self.transition = Some(ActiveTransition {
            id,
            from,
            to,
            effect: state,
        });
    }

    fn dispatch_slide(
        &mut self,
        to: usize,
        direction: Direction,
        duration: Duration,
        now: Instant,
    ) -> EffectState {
        let distance = direction.sign() * self.stage.slide_width(to);
        match self.support {
            TransitionSupport::Native(prefix) => {
                let slide = NativeSlide {
                    prefix,
                    distance_px: distance,
                    duration,
                };
                self.stage.apply_container_styles(&slide.declarations());
                EffectState::NativeSlide {
                    slide,
                    started_at: now,
                }
            }
            TransitionSupport::Manual => {
                EffectState::ManualSlide(Tween::new(0.0, distance, now, duration, Easing::Swing))
            }
        }
    }

    fn dispatch_fade(&mut self, to: usize, duration: Duration, now: Instant) -> EffectState {
        self.stage.set_opacity(to, 0.0);
        self.stage.set_visible(to, true);
        EffectState::Fade {
            fade_in: Tween::new(0.0, 1.0, now, duration, Easing::Swing),
            fade_out: Tween::new(1.0, 0.0, now, duration, Easing::Swing),
            fade_in_done: false,
            fade_out_done: false,
        }
    }

    /// Advances frame-driven animations.
    ///
    /// Native slides have no frames of their own; a host without
    /// transition-end notifications gets completion here once the declared
    /// duration has elapsed.
    pub fn on_frame(&mut self, now: Instant) -> Option<SlideChanged> {
        let transition = self.transition.as_mut()?;
        let (from, to) = (transition.from, transition.to);
        let finished = match &mut transition.effect {
            EffectState::NativeSlide { slide, started_at } => {
                now.saturating_duration_since(*started_at) >= slide.duration
            }
            EffectState::ManualSlide(tween) => {
                self.stage.set_container_offset(tween.sample(now));
                tween.is_complete(now)
            }
            EffectState::Fade {
                fade_in,
                fade_out,
                fade_in_done,
                fade_out_done,
            } => {
                if !*fade_in_done {
                    self.stage.set_opacity(to, fade_in.sample(now));
                    *fade_in_done = fade_in.is_complete(now);
                }
                if !*fade_out_done {
                    self.stage.set_opacity(from, fade_out.sample(now));
                    *fade_out_done = fade_out.is_complete(now);
                }
                *fade_in_done && *fade_out_done
            }
        };
        if !finished {
            return None;
        }
        if matches!(transition.effect, EffectState::NativeSlide { .. }) {
            return self.complete_native();
        }
        self.finish()
    }

    /// Completes the native slide `id`.
    ///
    /// Ignored unless `id` is the in-flight native slide: a notification
    /// arriving after the frame fallback already finished its transition
    /// must not cut the next one short.
    pub fn transition_end(&mut self, id: TransitionId) -> Option<SlideChanged> {
        if self.transition_id() != Some(id) {
            trace!(id = id.0, current = ?self.transition_id(), "stale transition end");
            return None;
        }
        self.complete_native()
    }

    fn complete_native(&mut self) -> Option<SlideChanged> {
        let Some(ActiveTransition {
            effect: EffectState::NativeSlide { slide, .. },
            ..
        }) = self.transition.as_ref()
        else {
            return None;
        };
        let properties = slide.properties();
        self.stage.clear_container_styles(&properties);
        self.finish()
    }

    fn finish(&mut self) -> Option<SlideChanged> {
        let ActiveTransition { from, to, .. } = self.transition.take()?;
        self.stage.set_visible(from, false);
        self.active = to;
        self.stage.set_container_offset(0.0);
        self.stage.set_slide_offset(to, 0.0);
        self.stage.set_slide_offset(from, 0.0);
        debug!(from, to, "transition_end");
        Some(SlideChanged { from, to })
    }

    /// Invokes every action bound to the clicked control.
    pub fn click(&mut self, click: &ClickEvent, now: Instant) {
        let actions: Vec<Action> = self
            .bindings
            .iter()
            .filter(|binding| binding.control == click.control)
            .map(|binding| binding.action)
            .collect();
        for action in actions {
            trace!(%action, "actionable clicked");
            match action {
                Action::Next => self.next(now),
                Action::Previous => self.previous(now),
                Action::GotoSlide => self.goto_slide(click.clone(), now),
            }
        }
    }

    pub fn command(&mut self, command: Command, now: Instant) {
        match command {
            Command::Next => self.next(now),
            Command::Previous => self.previous(now),
            Command::GotoSlide(target) => self.goto_slide(target, now),
            Command::Play => self.play(now),
            Command::Pause => self.pause(),
        }
    }

    /// Applies one event; returns the slide change it completed, if any.
    pub fn handle(&mut self, event: CarouselEvent, now: Instant) -> Option<SlideChanged> {
        match event {
            CarouselEvent::Command(command) => {
                self.command(command, now);
                None
            }
            CarouselEvent::Click(click) => {
                self.click(&click, now);
                None
            }
            CarouselEvent::AutoplayElapsed(id) => {
                if self.autoplay != Some(id) {
                    trace!(?id, "stale autoplay expiry");
                    return None;
                }
                self.autoplay = None;
                self.scheduler.cancel(id);
                self.next(now);
                None
            }
            CarouselEvent::TransitionEnd(id) => self.transition_end(id),
        }
    }
}

impl<S: Stage> Carousel<S, ManualScheduler> {
    /// Delivers every autoplay expiry due at `now`.
    pub fn fire_due_timers(&mut self, now: Instant) {
        for id in self.scheduler.take_due(now) {
            self.handle(CarouselEvent::AutoplayElapsed(id), now);
        }
    }
}
