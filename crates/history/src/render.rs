//! Flatten histories into the plain-text transcripts embedded in prompts.

use memoir_domain::config::NameMapping;
use memoir_domain::message::{Message, Role};

/// Speaker label for `role`. The assistant speaks as the identity itself.
pub fn display_name<'a>(role: Role, identity: &'a str, names: &'a NameMapping) -> &'a str {
    match role {
        Role::User => &names.human,
        Role::Assistant => identity,
        Role::System => &names.system,
    }
}

/// One `"<speaker> | <text>"` line per message.
pub fn compaction_transcript(messages: &[Message], identity: &str, names: &NameMapping) -> String {
    messages
        .iter()
        .map(|msg| {
            format!(
                "{} | {}",
                display_name(msg.role, identity, names),
                msg.content.flatten()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"<speaker>: <text>"` blocks separated by blank lines.
pub fn review_transcript(messages: &[Message], identity: &str, names: &NameMapping) -> String {
    let mut buf = String::new();
    for msg in messages {
        buf.push_str(display_name(msg.role, identity, names));
        buf.push_str(": ");
        buf.push_str(&msg.content.flatten());
        buf.push_str("\n\n");
    }
    buf
}
