//! Send pipeline
//!
//! Turns the draft into one request and exactly one settled bot message.
//! [`SendPipeline::submit`] runs the accept step synchronously against the
//! store and returns the suspended network call as a [`PendingAnswer`]. The
//! host drives that future however it likes (await it inline, or spawn it and
//! post the outcome back to its event loop) and hands the outcome to
//! [`ConversationStore::end_send`]. While it is outstanding the store is
//! `pending`, which makes every further `submit` a no-op.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::client::AnswerSource;
use crate::state::Sender;
use crate::store::{ConversationStore, Outcome};

#[derive(Clone)]
pub struct SendPipeline {
    source: Arc<dyn AnswerSource>,
}

impl SendPipeline {
    pub fn new(source: Arc<dyn AnswerSource>) -> Self {
        Self { source }
    }

    /// Accept the current draft and start the request for it.
    ///
    /// Returns `None` without touching the store when the draft is blank or a
    /// request is already in flight.
    pub fn submit(&self, store: &mut ConversationStore) -> Option<PendingAnswer> {
        if !store.state().can_submit() {
            return None;
        }

        let question = store.state().draft.clone();
        store.append_message(Sender::User, question.clone());
        store.set_draft("");
        let started = store.begin_send();
        debug_assert!(started, "can_submit checked pending");
        info!(len = question.len(), "send accepted");

        let source = Arc::clone(&self.source);
        let future: BoxFuture<'static, Outcome> =
            Box::pin(async move { source.ask(&question).await });
        Some(PendingAnswer { future })
    }
}

/// The request for one accepted send, not yet settled
#[must_use = "a pending answer must be settled or the widget stays pending"]
pub struct PendingAnswer {
    future: BoxFuture<'static, Outcome>,
}

impl PendingAnswer {
    /// Run the request to completion.
    pub async fn outcome(self) -> Outcome {
        self.future.await
    }

    /// Run the request and apply its outcome to `store`.
    pub async fn settle(self, store: &mut ConversationStore) {
        let outcome = self.outcome().await;
        store.end_send(outcome);
    }
}

impl std::fmt::Debug for PendingAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAnswer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SendError;
    use crate::state::Message;
    use crate::store::{FAILURE_DESCRIPTION, FALLBACK_MESSAGE};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockSource {
        reply: Result<String, SendError>,
        questions: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                questions: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: SendError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                questions: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.questions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnswerSource for MockSource {
        async fn ask(&self, question: &str) -> Result<String, SendError> {
            self.questions.lock().unwrap().push(question.to_string());
            self.reply.clone()
        }
    }

    fn store_with_draft(draft: &str) -> ConversationStore {
        let mut store = ConversationStore::new();
        store.set_draft(draft);
        store
    }

    #[tokio::test]
    async fn test_success_scenario() {
        let source = MockSource::answering("KitKat has 6g of protein per 100g.");
        let pipeline = SendPipeline::new(source.clone());
        let mut store = store_with_draft("What is the protein content of KitKat?");

        let pending = pipeline.submit(&mut store).expect("send accepted");
        pending.settle(&mut store).await;

        let state = store.state();
        assert_eq!(
            state.log,
            vec![
                Message::user("What is the protein content of KitKat?"),
                Message::bot("KitKat has 6g of protein per 100g."),
            ]
        );
        assert!(!state.pending);
        assert_eq!(state.last_error, "");
        assert_eq!(source.calls(), vec!["What is the protein content of KitKat?"]);
    }

    #[tokio::test]
    async fn test_failure_scenario() {
        let source = MockSource::failing(SendError::Network("connection refused".into()));
        let pipeline = SendPipeline::new(source);
        let mut store = store_with_draft("Hello");

        pipeline.submit(&mut store).expect("send accepted").settle(&mut store).await;

        let state = store.state();
        assert_eq!(
            state.log,
            vec![Message::user("Hello"), Message::bot(FALLBACK_MESSAGE)]
        );
        assert_eq!(state.last_error, FAILURE_DESCRIPTION);
        assert!(!state.pending);
    }

    #[test]
    fn test_submit_accepts_synchronously() {
        let source = MockSource::answering("unused");
        let pipeline = SendPipeline::new(source.clone());
        let mut store = store_with_draft("Hello");

        let pending = pipeline.submit(&mut store);
        assert!(pending.is_some());

        let state = store.state();
        assert_eq!(state.log, vec![Message::user("Hello")]);
        assert_eq!(state.draft, "");
        assert!(state.pending);
        // Nothing goes out until the pending answer is driven.
        assert!(source.calls().is_empty());
    }

    #[test]
    fn test_blank_draft_is_noop() {
        let pipeline = SendPipeline::new(MockSource::answering("unused"));
        for draft in ["", "   ", "\n\t "] {
            let mut store = store_with_draft(draft);
            let before = store.state().clone();
            assert!(pipeline.submit(&mut store).is_none());
            assert_eq!(*store.state(), before);
        }
    }

    #[tokio::test]
    async fn test_at_most_one_in_flight() {
        let source = MockSource::answering("first answer");
        let pipeline = SendPipeline::new(source.clone());
        let mut store = store_with_draft("first");

        let first = pipeline.submit(&mut store).expect("first send accepted");
        store.set_draft("second");
        let before = store.state().clone();
        assert!(pipeline.submit(&mut store).is_none());
        assert_eq!(*store.state(), before);

        first.settle(&mut store).await;
        assert_eq!(source.calls(), vec!["first"]);
        assert_eq!(store.state().log.len(), 2);
        // The second draft survives and can be sent once the first settles.
        assert_eq!(store.state().draft, "second");
    }

    #[tokio::test]
    async fn test_log_grows_by_two_per_send() {
        let ok = SendPipeline::new(MockSource::answering("yes"));
        let bad = SendPipeline::new(MockSource::failing(SendError::Status(503)));
        let mut store = ConversationStore::new();

        for (i, pipeline) in [&ok, &bad, &ok].into_iter().enumerate() {
            store.set_draft(format!("question {i}"));
            let before = store.state().log.len();
            pipeline.submit(&mut store).expect("accepted").settle(&mut store).await;
            assert_eq!(store.state().log.len(), before + 2);
            assert!(!store.state().pending);
        }
    }

    #[tokio::test]
    async fn test_question_sent_verbatim() {
        let source = MockSource::answering("ok");
        let pipeline = SendPipeline::new(source.clone());
        let mut store = store_with_draft("  padded question \n");

        pipeline.submit(&mut store).expect("accepted").settle(&mut store).await;
        assert_eq!(source.calls(), vec!["  padded question \n"]);
        assert_eq!(store.state().log[0].text(), "  padded question \n");
    }

    #[tokio::test]
    async fn test_next_send_clears_previous_error() {
        let source = MockSource::failing(SendError::Decode("missing field `answer`".into()));
        let pipeline = SendPipeline::new(source);
        let mut store = store_with_draft("one");
        pipeline.submit(&mut store).expect("accepted").settle(&mut store).await;
        assert!(store.state().has_error());

        store.set_draft("two");
        let pending = pipeline.submit(&mut store).expect("accepted");
        assert_eq!(store.state().last_error, "");
        pending.settle(&mut store).await;
        assert!(store.state().has_error());
    }
}
