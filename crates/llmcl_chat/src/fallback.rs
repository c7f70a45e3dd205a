//! Canned replies shown when the endpoint can not answer

use crate::transport::FetchError;
use crate::wire::ChatResponse;
use serde::Serialize;
use tracing::warn;

/// Notation replies used in place of a completion, picked by turn
pub const FALLBACK_REPLIES: [&str; 4] = [
    "@v1.0{#response~acknowledgment{^prev1}}",
    "@v1.0{#response~information{#c501~symbolic #c142 ~has{#c2231~logic #c8701~rules}}}",
    "@v1.0{#response~comparison{#c501~connectionist ~versus{#c501~symbolic}}}",
    "@v1.0{#response~clarification{$query{^prev1.#topic}}}",
];

/// Where a reply came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ReplyOrigin {
    Endpoint { total_tokens: u32 },
    Fallback { reason: String },
}

/// What is shown to the user for a single turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub content: String,
    #[serde(flatten)]
    pub origin: ReplyOrigin,
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ReplyOrigin::Fallback { .. })
    }

    /// A rough token count, one per whitespace separated word
    pub fn estimated_tokens(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// The canned reply for a turn
pub fn fallback_reply(turn: usize) -> &'static str {
    FALLBACK_REPLIES[turn % FALLBACK_REPLIES.len()]
}

/// Turns the result of a send into the reply to show.
///
/// Endpoint failures become a canned reply that records why. Errors caused by the user's own
/// input are handed back, since there is nothing to reply to.
pub fn reply_or_fallback(
    result: Result<ChatResponse, FetchError>,
    turn: usize,
) -> Result<Reply, FetchError> {
    let reason = match result {
        Ok(response) => match response.content() {
            Some(content) => {
                return Ok(Reply {
                    content: content.to_string(),
                    origin: ReplyOrigin::Endpoint {
                        total_tokens: response.usage.total_tokens,
                    },
                })
            }
            None => FetchError::NoChoices.to_string(),
        },
        Err(e) if e.is_input_error() => return Err(e),
        Err(e) => e.to_string(),
    };
    warn!("falling back to a canned reply: {reason}");
    Ok(Reply {
        content: fallback_reply(turn).to_string(),
        origin: ReplyOrigin::Fallback { reason },
    })
}
