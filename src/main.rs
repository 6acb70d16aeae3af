mod sample;

use anyhow::{Context, Result};
use chatcmd::config;
use chatcmd::logging::{self, ChatLogger};
use chatcmd::{ConnectionState, Connector, ConnectorRegistry, Dispatcher, StepOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load_config()?;
    logging::init_tracing(&cfg.logging);

    let path = config::config_path();
    if !path.exists() {
        config::save_config(&cfg)?;
        info!("wrote default config to {}", path.display());
    }

    let registry = ConnectorRegistry::new();
    let mut connector = registry
        .create(&cfg.connection, &cfg.rate_limit)
        .context("Failed to create connector")?;

    let light = Arc::new(Mutex::new(sample::Light::default()));
    let mut dispatcher = Dispatcher::new(cfg.commands.help_verb.clone());
    sample::register(&mut dispatcher, light);
    info!(
        commands = dispatcher.commands().len(),
        help = dispatcher.help_verb(),
        "commands registered"
    );
    connector.subscribe(move |msg| dispatcher.handle_message(msg));

    if cfg.logging.transcript {
        let mut transcript = ChatLogger::new(&cfg.logging, &cfg.connection.channel);
        connector.subscribe(move |msg| {
            transcript.log_message(msg);
            Vec::new()
        });
    }

    if !cfg.connection.initialize_on_start {
        warn!(
            "initialize_on_start is disabled in {}; nothing to do",
            path.display()
        );
        return Ok(());
    }
    connector.initialize().await?;
    info!(
        username = connector.username(),
        channel = connector.channel(),
        "listening; press Ctrl-C to stop"
    );

    let result = run(&mut connector, cfg.driver.tick()).await;
    connector.teardown();
    result
}

/// Drive the connector once per `period` until it disconnects or Ctrl-C.
async fn run(connector: &mut Connector, period: Duration) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("interrupted, shutting down");
                return Ok(());
            }
        }

        let now = Instant::now();
        connector
            .tick(now - last)
            .context("Failed to send queued lines")?;
        last = now;

        if connector.step().context("Connection lost")? == StepOutcome::Stopped
            && connector.state() == ConnectionState::Disconnected
        {
            info!("connector stopped");
            return Ok(());
        }
    }
}
