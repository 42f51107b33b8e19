//! Terminal front end for the dashboard client
//!
//! Plain lines are submitted as commands. Slash commands drive the queue
//! and the agents:
//!
//! ```text
//! /up <id>  /down <id>  /play <id>  /pause <id>  /cancel <id>
//! /start <agent>  /stop <agent>  /reset <agent>
//! /voice  /status  /quit
//! ```

use std::sync::Arc;

use omnidash_api::client::{Dashboard, HttpCollaborator};
use omnidash_api::config::ClientConfig;
use omnidash_api::domain::agent::AgentControl;
use omnidash_api::domain::queue::{Direction, QueueCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = ClientConfig::from_env();
    let collaborator =
        HttpCollaborator::new(&config.api_url).expect("Failed to create collaborator client");
    let dashboard = Dashboard::new(config, Arc::new(collaborator));
    dashboard.start().await;

    // Echo new execution log entries as they arrive.
    let mut changes = dashboard.subscribe();
    tokio::spawn(async move {
        let mut last_seen: Option<String> = None;
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().clone();
            let fresh: Vec<_> = state
                .log
                .iter()
                .take_while(|entry| Some(&entry.id) != last_seen.as_ref())
                .collect();
            for entry in fresh.iter().rev() {
                println!("[{:?}] {}", entry.level, entry.message);
            }
            if let Some(latest) = state.log.latest() {
                last_seen = Some(latest.id.clone());
            }
        }
    });

    let mut notifications = dashboard.notifications();
    tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            println!("** {}: {}", notification.title, notification.description);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Err(err) = handle_line(&dashboard, line).await {
            eprintln!("error: {}", err);
        }
    }

    dashboard.shutdown();
}

async fn handle_line(dashboard: &Dashboard, line: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(rest) = line.strip_prefix('/') else {
        dashboard.submit_command(line).await?;
        return Ok(());
    };

    let (verb, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    let arg = arg.trim();
    match verb {
        "up" => dashboard.move_action(arg, Direction::Up)?,
        "down" => dashboard.move_action(arg, Direction::Down)?,
        "play" => dashboard.change_action_status(arg, QueueCommand::Play)?,
        "pause" => dashboard.change_action_status(arg, QueueCommand::Pause)?,
        "cancel" => dashboard.change_action_status(arg, QueueCommand::Cancel)?,
        "start" => dashboard.control_agent(arg, AgentControl::Start)?,
        "stop" => dashboard.control_agent(arg, AgentControl::Pause)?,
        "reset" => dashboard.control_agent(arg, AgentControl::Reset)?,
        "voice" => {
            // No microphone here; an empty clip exercises the transcription path.
            dashboard.process_voice(Vec::new()).await?;
        }
        "status" => print_status(dashboard),
        other => println!("unknown command: /{}", other),
    }
    Ok(())
}

fn print_status(dashboard: &Dashboard) {
    let state = dashboard.snapshot();
    println!(
        "connected={} tasks={} queued={} load={:.1}",
        state.connected,
        state.tasks.len(),
        state.queue.len(),
        state.metrics.system_load
    );
    for agent in &state.agents {
        println!(
            "  {} {:<16} {:<10} {:>5.1}%  {}",
            agent.avatar,
            agent.name,
            agent.status.to_string(),
            agent.progress,
            agent.last_action
        );
    }
    for action in state.queue.iter() {
        println!("  [{:?}] {} {}", action.status, action.id, action.instruction);
    }
}
