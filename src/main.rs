//! Binary entrypoint: replays a page description against headless carousels.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep_until;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rust_carousel::actions::ClickEvent;
use rust_carousel::carousel::Carousel;
use rust_carousel::config::{Configuration, ScriptedClick};
use rust_carousel::events::{CarouselEvent, SlideChanged};
use rust_carousel::markup::Document;
use rust_carousel::schedule::TokioScheduler;
use rust_carousel::stage::HeadlessStage;
use rust_carousel::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "carousel",
    version,
    about = "Run carousels described by a YAML page on headless stages"
)]
struct Args {
    /// Path to YAML page description
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Stop after this long (e.g. "12s"); overrides `run-for`
    #[arg(long = "run-for", value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args { config, run_for } = Args::parse();

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let doc = Arc::new(Document::from_specs(&cfg.elements));
    let mounts = doc.auto_mounts(&cfg.defaults);
    if mounts.is_empty() {
        bail!("no element in {} carries data-slider", config.display());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let (changes_tx, mut changes_rx) = mpsc::channel::<SlideChanged>(64); // Carousels -> log
    let mut controls = Vec::with_capacity(mounts.len());
    let mut tasks = JoinSet::new();
    for mount in mounts {
        let (event_tx, event_rx) = mpsc::channel::<CarouselEvent>(16); // Clicks/timers -> Carousel
        let stage = HeadlessStage::from_document(
            &doc,
            mount.container,
            cfg.environment.viewport_width,
        )
        .with_supported_styles(cfg.environment.supported_styles.iter().cloned());
        let name = doc
            .get(mount.container)
            .and_then(|node| node.id.clone())
            .unwrap_or_else(|| format!("{:?}", mount.container));
        let carousel = Carousel::new(
            stage,
            mount.config,
            mount.bindings,
            TokioScheduler::new(event_tx.clone()),
            Instant::now(),
        );
        tracing::info!(
            carousel = %name,
            slides = carousel.slide_count(),
            effect = %carousel.config().transition_effect,
            support = ?carousel.support(),
            autoplay = carousel.is_playing(),
            "carousel mounted"
        );
        controls.push(event_tx);

        let changes_tx = changes_tx.clone();
        let frame_interval = cfg.environment.frame_interval;
        let cancel = cancel.clone();
        tasks.spawn(async move {
            tasks::carousel::run(carousel, event_rx, changes_tx, frame_interval, cancel)
                .await
                .with_context(|| format!("carousel {name} failed"))
        });
    }
    drop(changes_tx);

    // Scripted clicks
    tasks.spawn({
        let doc = doc.clone();
        let clicks = cfg.clicks.clone();
        let cancel = cancel.clone();
        async move { replay_clicks(&doc, clicks, controls, cancel).await }
    });

    if let Some(limit) = run_for.or(cfg.run_for) {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::info!(?limit, "run time elapsed; initiating shutdown");
            cancel.cancel();
        });
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe_change = changes_rx.recv() => match maybe_change {
                Some(SlideChanged { from, to }) => println!("{from} -> {to}"),
                None => break,
            },
        }
    }

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!("task error: {err:?}"),
            Err(join_err) => tracing::error!("task panicked: {join_err}"),
        }
    }
    Ok(())
}

async fn replay_clicks(
    doc: &Document,
    mut clicks: Vec<ScriptedClick>,
    controls: Vec<mpsc::Sender<CarouselEvent>>,
    cancel: CancellationToken,
) -> Result<()> {
    clicks.sort_by_key(|click| click.after);
    let start = tokio::time::Instant::now();
    for click in clicks {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = sleep_until(start + click.after) => {}
        }
        let target = click.target.as_deref().and_then(|raw| doc.query(raw).first().copied());
        let matched = doc.query(&click.selector);
        if matched.is_empty() {
            tracing::warn!(selector = %click.selector, "scripted click matched nothing");
        }
        for control in matched {
            let event = match target {
                Some(target) => ClickEvent::with_target(doc, control, target),
                None => ClickEvent::on(doc, control),
            };
            tracing::info!(selector = %click.selector, "click");
            for tx in &controls {
                if tx.send(CarouselEvent::Click(event.clone())).await.is_err() {
                    tracing::debug!("carousel stopped before scripted click");
                }
            }
        }
    }
    Ok(())
}
