//! A single conversation with the endpoint

use crate::credentials::{Credential, CredentialStore};
use crate::transport::{ChatTransport, FetchError};
use crate::wire::{ChatConfig, ChatMessage, ChatResponse};
use llmcl_ir::ids::ContentHashIds;
use llmcl_ir::ir::{IrNode, Message, Reference};
use llmcl_ir::lower::lower_message;
use llmcl_ir::normalize::Normalizer;
use llmcl_ir::resolve::{ContextBuffer, ResolveError};
use llmcl_syntax::lexer::tokenize;
use llmcl_syntax::parser::parse;
use tracing::{debug, info, instrument, trace};

/// Everything a conversation needs, created by [ChatContext::initialize] and torn down by
/// [ChatContext::shutdown].
///
/// Only the last [ChatConfig::context_size] messages are kept. They are kept twice: as text, sent
/// along with every request, and as normalized IR that references in later messages resolve
/// against.
pub struct ChatContext<T, S> {
    transport: T,
    store: S,
    config: ChatConfig,
    credential: Option<Credential>,
    history: Vec<ChatMessage>,
    context: ContextBuffer,
    turns: usize,
}

impl<T: ChatTransport, S: CredentialStore> ChatContext<T, S> {
    /// Creates the context, loading any saved credential
    pub fn initialize(transport: T, store: S, config: ChatConfig) -> Result<Self, FetchError> {
        let credential = store.load()?;
        info!(
            "chat context initialized, credential {}",
            if credential.is_some() { "loaded" } else { "missing" }
        );
        let context = ContextBuffer::new(config.context_size);
        Ok(Self {
            transport,
            store,
            config,
            credential,
            history: vec![],
            context,
            turns: 0,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// The kept messages, oldest first
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The kept messages as normalized IR
    pub fn context(&self) -> &ContextBuffer {
        &self.context
    }

    /// The number of messages that reached the transport, answered or not
    pub fn turn(&self) -> usize {
        self.turns
    }

    /// Persists a new credential and uses it from now on
    pub fn save_credential(&mut self, secret: &str) -> Result<(), FetchError> {
        let credential = Credential::new(secret).ok_or(FetchError::EmptyCredential)?;
        self.store.save(&credential)?;
        self.credential = Some(credential);
        debug!("credential saved");
        Ok(())
    }

    /// Every reference in `text` that the kept messages can not resolve, in tree order
    pub fn unresolved_references(&self, text: &str) -> Vec<(Reference, ResolveError)> {
        let message = IrNode::Message(read_notation(text));
        self.context
            .resolve_all(&message)
            .into_iter()
            .filter_map(|(reference, resolution)| {
                resolution.err().map(|error| (reference.clone(), error))
            })
            .collect()
    }

    /// Sends a message and waits for the completion.
    ///
    /// A blank message fails with [FetchError::EmptyMessage] without touching the transport or
    /// the history. The message and its answer are only kept once the answer arrives.
    #[instrument(level = "debug", skip_all, fields(turn = self.turns))]
    pub async fn send(&mut self, text: &str) -> Result<ChatResponse, FetchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FetchError::EmptyMessage);
        }
        let credential = self
            .credential
            .as_ref()
            .ok_or(FetchError::MissingCredential)?;
        for (reference, error) in self.unresolved_references(text) {
            debug!("unresolved reference {reference:?}: {error}");
        }

        let user = ChatMessage::user(text);
        let mut messages = self.history.clone();
        messages.push(user.clone());
        let request = self.config.request(&messages);
        self.turns += 1;
        let response = self.transport.complete(credential, &request).await?;
        let content = response.content().ok_or(FetchError::NoChoices)?;
        debug!("received {} tokens", response.usage.total_tokens);

        self.context.push(read_notation(text));
        self.context.push(read_notation(content));
        self.history.push(user);
        self.history.push(ChatMessage::assistant(content));
        let excess = self.history.len().saturating_sub(self.config.context_size);
        if excess > 0 {
            trace!("dropping {excess} messages from history");
            self.history.drain(..excess);
        }
        Ok(response)
    }

    /// Tears the context down, handing back the kept messages
    pub fn shutdown(self) -> Vec<ChatMessage> {
        info!(
            "chat context shut down after {} turns, {} messages kept",
            self.turns,
            self.history.len()
        );
        self.history
    }
}

/// Reads message text as normalized IR, skipping whatever is malformed
fn read_notation(text: &str) -> Message {
    let lowered = lower_message(&parse(tokenize(text)));
    Normalizer::new(ContentHashIds).normalize_message(&lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::wire::{ChatRequest, Role};
    use llmcl_ir::ir::IrNode;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use test_log::test;

    #[derive(Default)]
    struct Echo {
        requests: Mutex<Vec<ChatRequest>>,
        /// How many of the coming requests fail
        failures: Mutex<usize>,
    }

    impl Echo {
        fn failing(failures: usize) -> Self {
            Self {
                failures: Mutex::new(failures),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChatTransport for Echo {
        async fn complete(
            &self,
            _credential: &Credential,
            request: &ChatRequest,
        ) -> Result<ChatResponse, FetchError> {
            self.requests.lock().push(request.clone());
            {
                let mut failures = self.failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(FetchError::transport("connection reset"));
                }
            }
            let last = request.messages.last().map(|m| m.content.clone());
            Ok(ChatResponse::from_content(last.unwrap_or_default(), 5))
        }
    }

    fn store() -> MemoryCredentialStore {
        MemoryCredentialStore::with_credential(Credential::new("sk-test").expect("not blank"))
    }

    #[test(tokio::test)]
    async fn test_send_records_history() {
        let mut context = ChatContext::initialize(Echo::default(), store(), ChatConfig::default())
            .expect("initialized");
        context.send("@v1.0{#c1}").await.expect("sent");
        context.send("  @v1.0{#c2}  ").await.expect("sent");

        assert_eq!(context.turn(), 2);
        {
            let requests = context.transport().requests.lock();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[1].messages.len(), 3);
            assert_eq!(requests[1].messages[2], ChatMessage::user("@v1.0{#c2}"));
        }

        let history = context.shutdown();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3], ChatMessage::assistant("@v1.0{#c2}"));
    }

    #[test(tokio::test)]
    async fn test_failed_send_keeps_nothing() {
        let mut context = ChatContext::initialize(Echo::failing(1), store(), ChatConfig::default())
            .expect("initialized");
        context.send("@v1.0{#c1}").await.expect_err("transport fails");
        assert_eq!(context.turn(), 1);
        assert!(context.history().is_empty());
        assert!(context.context().is_empty());

        context.send("@v1.0{#c2}").await.expect("sent");
        let requests = context.transport().requests.lock();
        assert_eq!(requests[1].messages, vec![ChatMessage::user("@v1.0{#c2}")]);
        drop(requests);
        let roles = context
            .history()
            .iter()
            .map(|message| message.role)
            .collect::<Vec<_>>();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }

    #[test(tokio::test)]
    async fn test_history_is_bounded() {
        let config = ChatConfig {
            context_size: 3,
            ..ChatConfig::default()
        };
        let mut context =
            ChatContext::initialize(Echo::default(), store(), config).expect("initialized");
        for text in ["@v1.0{#c1}", "@v1.0{#c2}", "@v1.0{#c3}"] {
            context.send(text).await.expect("sent");
        }

        assert_eq!(context.turn(), 3);
        assert_eq!(context.history().len(), 3);
        assert_eq!(context.history()[0], ChatMessage::assistant("@v1.0{#c2}"));
        assert_eq!(context.context().len(), 3);
        {
            let requests = context.transport().requests.lock();
            assert_eq!(requests[2].messages.len(), 4, "three kept plus the pending one");
        }
        let first = context.context().iter().next().expect("kept");
        assert!(matches!(
            &first.children[..],
            [IrNode::Concept(concept)] if concept.id == "c2"
        ));
    }

    #[test(tokio::test)]
    async fn test_references_resolve_against_earlier_replies() {
        let mut context = ChatContext::initialize(Echo::default(), store(), ChatConfig::default())
            .expect("initialized");
        let text = "@v1.0{^prev1.#approaches.#agi}";
        let unresolved = context.unresolved_references(text);
        assert!(matches!(
            &unresolved[..],
            [(_, ResolveError::PrevOutOfRange { back: 1, available: 0 })]
        ));

        context
            .send("@v1.0{#c501~approaches{#c142~agi}}")
            .await
            .expect("sent");
        assert!(context.unresolved_references(text).is_empty());
        assert!(context
            .unresolved_references("@v1.0{^prev2.#c501.#c142 ^self}")
            .is_empty());

        let unresolved = context.unresolved_references("@v1.0{^prev1.#c9 ^prev3 ^elsewhere}");
        let errors = unresolved
            .into_iter()
            .map(|(_, error)| error)
            .collect::<Vec<_>>();
        assert_eq!(
            errors,
            vec![
                ResolveError::SegmentNotFound("#c9".to_string()),
                ResolveError::PrevOutOfRange {
                    back: 3,
                    available: 2
                },
                ResolveError::UnknownSource("elsewhere".to_string()),
            ]
        );
    }

    #[test(tokio::test)]
    async fn test_empty_message_never_reaches_transport() {
        let mut context = ChatContext::initialize(Echo::default(), store(), ChatConfig::default())
            .expect("initialized");
        let err = context.send(" \t\n").await.expect_err("blank");
        assert!(matches!(err, FetchError::EmptyMessage));
        assert!(context.transport().requests.lock().is_empty());
        assert!(context.history().is_empty());
    }

    #[test(tokio::test)]
    async fn test_missing_credential() {
        let mut context = ChatContext::initialize(
            Echo::default(),
            MemoryCredentialStore::new(),
            ChatConfig::default(),
        )
        .expect("initialized");
        assert!(!context.has_credential());
        let err = context.send("@v1.0{#c1}").await.expect_err("no credential");
        assert!(matches!(err, FetchError::MissingCredential));
        assert!(context.transport().requests.lock().is_empty());
        assert!(context.history().is_empty());

        context.save_credential("sk-late").expect("saved");
        context.send("@v1.0{#c1}").await.expect("sent");
    }

    #[test]
    fn test_blank_credential_is_rejected() {
        let mut context = ChatContext::initialize(
            Echo::default(),
            MemoryCredentialStore::new(),
            ChatConfig::default(),
        )
        .expect("initialized");
        assert!(matches!(
            context.save_credential("   "),
            Err(FetchError::EmptyCredential)
        ));
        assert!(!context.has_credential());
    }
}
