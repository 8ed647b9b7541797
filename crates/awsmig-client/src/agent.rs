//! Chat Agent
//!
//! Rule-based assistant for the migration wizard. Free text is mapped onto
//! a small set of intents by case-insensitive substring containment; start
//! and complete relay to the store against the current step, explain and
//! help only answer. Exactly one action per message, first matching rule
//! wins.

use awsmig_core::{MigrationState, MigrationStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Agent,
    User,
    System,
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Step the message refers to, when the agent acted on one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_step_id: Option<u32>,
}

impl AgentMessage {
    fn new(role: MessageRole, content: String, related_step_id: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            related_step_id,
        }
    }
}

/// Intent matched from operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentIntent {
    Start,
    Complete,
    Help,
    Explain,
}

impl AgentIntent {
    /// Case-insensitive substring dispatch. Rules are tested in order
    /// (start, complete, help, explain) and the first match wins; no match
    /// yields `None` and a clarification reply.
    pub fn classify(input: &str) -> Option<Self> {
        let input = input.to_lowercase();
        let has = |needle: &str| input.contains(needle);

        if has("start") || has("begin") || has("proceed") {
            Some(Self::Start)
        } else if has("complete") || has("done") || has("finished") {
            Some(Self::Complete)
        } else if has("help") {
            Some(Self::Help)
        } else if has("explain") || has("what") || has("how") {
            Some(Self::Explain)
        } else {
            None
        }
    }
}

const WELCOME: &str = "Welcome to the AWS Migration Agent. I'm here to help you migrate your \
     AWS accounts from one organization to another. Would you like to start the migration \
     process?";

const HELP_REPLY: &str = "I'm here to help you with the AWS account migration process. You can \
     ask me to start a step, mark it as complete, or provide more information about any step in \
     the migration. What would you like to know?";

const FALLBACK_REPLY: &str = "I understand you're working on the migration process. What \
     specific action would you like to take with the current step? You can ask me to start it, \
     complete it, or explain it in more detail.";

const NO_STEP_REPLY: &str = "No step is active right now. Start the migration and I'll walk \
     you through it.";

/// The rule-based chat agent; owns the transcript and relays start/complete
/// to the store. Purely reactive: it never calls the backend itself.
#[derive(Debug, Clone)]
pub struct ChatAgent {
    messages: Vec<AgentMessage>,
}

impl Default for ChatAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAgent {
    pub fn new() -> Self {
        Self {
            messages: vec![AgentMessage::new(
                MessageRole::Agent,
                WELCOME.to_string(),
                None,
            )],
        }
    }

    /// The transcript, oldest first.
    pub fn messages(&self) -> &[AgentMessage] {
        &self.messages
    }

    /// Process one operator message: record it, classify, apply the mapped
    /// store action against the current step, and append the reply. The
    /// reply is returned for immediate display.
    pub fn handle_message(&mut self, input: &str, state: &mut MigrationState) -> AgentMessage {
        self.messages
            .push(AgentMessage::new(MessageRole::User, input.to_string(), None));

        let current = state.current_step().cloned();
        let intent = AgentIntent::classify(input);
        debug!(?intent, "classified chat message");

        let reply = match (intent, current) {
            (Some(AgentIntent::Start), Some(step)) => {
                state.start_step(step.id);
                AgentMessage::new(
                    MessageRole::Agent,
                    format!(
                        "I'll start the current step for you. This will initiate \"{}\" \
                         against the selected account.",
                        step.title
                    ),
                    Some(step.id),
                )
            }
            (Some(AgentIntent::Complete), Some(step)) => {
                state.complete_step(step.id);
                AgentMessage::new(
                    MessageRole::Agent,
                    "Great! I've marked this step as complete. Let's move on to the next \
                     step in the migration process."
                        .to_string(),
                    Some(step.id),
                )
            }
            (Some(AgentIntent::Help), _) => {
                AgentMessage::new(MessageRole::Agent, HELP_REPLY.to_string(), None)
            }
            (Some(AgentIntent::Explain), Some(step)) => {
                AgentMessage::new(MessageRole::Agent, explain(&step), Some(step.id))
            }
            (Some(_), None) => {
                AgentMessage::new(MessageRole::Agent, NO_STEP_REPLY.to_string(), None)
            }
            (None, _) => AgentMessage::new(MessageRole::Agent, FALLBACK_REPLY.to_string(), None),
        };

        self.messages.push(reply.clone());
        reply
    }
}

fn explain(step: &MigrationStep) -> String {
    let automation = if step.api_available {
        "This step can be automated using AWS APIs."
    } else {
        "This step requires manual intervention."
    };
    format!(
        "The current step \"{}\" is part of the {} phase. {}. {}",
        step.title, step.phase, step.description, automation
    )
}
