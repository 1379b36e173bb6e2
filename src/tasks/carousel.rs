use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::carousel::Carousel;
use crate::events::{CarouselEvent, SlideChanged};
use crate::schedule::Scheduler;
use crate::stage::Stage;

/// Owns one carousel and feeds it events, animation frames and timer expiries.
///
/// Frames tick every `frame_interval` only while a transition is in flight.
/// Completed transitions are forwarded on `changes`. On cancellation the
/// autoplay timer is disarmed; an in-flight transition is left as is.
///
/// A [`TokioScheduler`](crate::schedule::TokioScheduler) keeps a sender of
/// `events` alive, so with it only `cancel` ends the loop. Schedulers that
/// hold no sender also stop once every sender is dropped.
pub async fn run<S, T>(
    mut carousel: Carousel<S, T>,
    mut events: Receiver<CarouselEvent>,
    changes: Sender<SlideChanged>,
    frame_interval: Duration,
    cancel: CancellationToken,
) -> Result<()>
where
    S: Stage,
    T: Scheduler,
{
    let mut frames = interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let animating = carousel.is_animating();
        let changed = select! {
            _ = cancel.cancelled() => break,

            maybe_ev = events.recv() => {
                match maybe_ev {
                    Some(event) => {
                        debug!(?event, "carousel event");
                        let starting = !carousel.is_animating();
                        let changed = carousel.handle(event, Instant::now());
                        if starting && carousel.is_animating() {
                            // First frame one period after dispatch.
                            frames.reset();
                        }
                        changed
                    }
                    None => {
                        debug!("carousel event channel closed");
                        break;
                    }
                }
            }

            _ = frames.tick(), if animating => carousel.on_frame(Instant::now()),
        };

        if let Some(change) = changed {
            info!(from = change.from, to = change.to, "slide changed");
            select! {
                _ = cancel.cancelled() => break,
                sent = changes.send(change) => {
                    if sent.is_err() {
                        warn!("slide change receiver closed");
                    }
                }
            }
        }
    }

    carousel.pause();
    Ok(())
}
