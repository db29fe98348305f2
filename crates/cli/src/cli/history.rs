use memoir_domain::config::Config;
use memoir_domain::message::{Message, MessageContent};
use memoir_history::render::display_name;
use memoir_history::{HistoryManager, ReviewOutcome};

use super::RoleArg;

pub async fn show(
    manager: &HistoryManager,
    config: &Config,
    identity: &str,
    json: bool,
) -> anyhow::Result<()> {
    let history = manager.get_recent_history(identity).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("(no history for {identity})");
        return Ok(());
    }
    for msg in &history {
        println!(
            "{}: {}",
            display_name(msg.role, identity, &config.names),
            msg.content.flatten()
        );
    }
    Ok(())
}

pub async fn append(
    manager: &HistoryManager,
    identity: &str,
    role: RoleArg,
    text: String,
    detailed: bool,
) -> anyhow::Result<()> {
    let message = Message::new(role.into(), MessageContent::Text(text));
    manager.update_history(vec![message], identity, detailed).await;
    let len = manager.get_recent_history(identity).await.len();
    println!("{identity}: {len} message(s) stored");
    Ok(())
}

/// Run one review pass; Ctrl-C cancels it at the next checkpoint.
pub async fn review(manager: &HistoryManager, identity: &str) -> anyhow::Result<()> {
    let token = manager.begin_review(identity);
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("cancelling review...");
                token.cancel();
            }
        })
    };

    let outcome = manager.run_review(identity, &token).await;
    watcher.abort();

    match outcome {
        ReviewOutcome::Corrected {
            messages,
            explanation,
        } => {
            println!("review applied: {} message(s)", messages.len());
            if !explanation.is_empty() {
                println!("{explanation}");
            }
        }
        ReviewOutcome::NotPerformed(reason) => println!("review not performed: {reason}"),
    }
    Ok(())
}
