//! Headless battle server.
//!
//! Loads content, starts the runtime and plays the campaign through. With
//! autopilot on (the default) both teams are driven by the AI; after every
//! victory the post-battle bonuses are rolled, applied and the next level
//! starts. The run ends on game over, after the last level, or once the tick
//! budget is spent.
//!
//! ```bash
//! BATTLE_SEED=42 BATTLE_TICK_MS=1 cargo run -p battle-server
//! ```

mod config;
mod logging;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use battle_content::ContentFactory;
use battle_core::{Command, ContentOracle, SessionId, WorldEvent};
use battle_runtime::{Notification, Runtime, RuntimeHandle, SessionFeed};

use crate::config::ServerConfig;

/// Session the server uses to mirror the message log into tracing.
const LOG_SESSION: SessionId = SessionId(0);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::setup_logging();

    let config = ServerConfig::from_env();
    tracing::info!(?config, "Starting battle server");

    let content = ContentFactory::new(config.data_dir.clone())
        .load_static()
        .with_context(|| format!("loading content from {}", config.data_dir.display()))?;
    let level_count = content.level_count();
    anyhow::ensure!(
        config.start_level < level_count,
        "start level {} out of range, campaign has {} levels",
        config.start_level,
        level_count
    );
    if !config.autopilot {
        tracing::warn!("autopilot is off and the server takes no player input");
    }

    let runtime = Runtime::builder()
        .config(config.runtime_config())
        .content(content)
        .build()?;
    let handle = runtime.handle();

    let feed = handle.listen(LOG_SESSION).await?;
    let logger = tokio::spawn(mirror_messages(feed));

    match tokio::time::timeout(
        config.time_budget(),
        play(&handle, config.start_level, level_count),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => tracing::warn!(max_ticks = config.max_ticks, "tick budget exhausted"),
    }

    handle.part(LOG_SESSION).await?;
    drop(handle);
    runtime.shutdown().await?;
    logger.await.context("message logger panicked")?;

    tracing::info!("Battle server stopped");
    Ok(())
}

/// Plays levels from `start` until the campaign ends either way.
async fn play(handle: &RuntimeHandle, start: u32, level_count: u32) -> Result<()> {
    let mut events = handle.subscribe_events();
    handle.apply(Command::StartBattle { level: start }).await?;

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event stream lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => anyhow::bail!("runtime stopped early"),
        };

        match event {
            WorldEvent::BattleStarted { level, map } => {
                tracing::info!(level, %map, "battle started");
            }
            WorldEvent::Victory { level, score } => {
                tracing::info!(level, score, "victory");
                let next = level + 1;
                if next >= level_count {
                    tracing::info!(score, "campaign complete");
                    return Ok(());
                }
                for offer in handle.offer_bonuses().await? {
                    tracing::info!(unit = %offer.unit, bonus = %offer.bonus.label(), "bonus");
                    handle
                        .apply(Command::ApplyBonus {
                            slot: offer.slot,
                            bonus: offer.bonus,
                        })
                        .await?;
                }
                handle.apply(Command::StartBattle { level: next }).await?;
            }
            WorldEvent::GameOver { score } => {
                tracing::info!(score, "game over");
                return Ok(());
            }
            _ => {}
        }
    }
}

async fn mirror_messages(mut feed: SessionFeed) {
    while let Some(notification) = feed.recv().await {
        if let Notification::Message(text) = notification {
            tracing::info!(target: "battle::log", "{text}");
        }
    }
}
