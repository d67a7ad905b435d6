//! Submit handling for the chat form.
//!
//! A submission validates the input, echoes it into the transcript, and spawns
//! one ask request. The request's outcome comes back to the event loop as an
//! [`AppEvent::Answer`] and is applied by [`ChatFormHandler::on_reply`], so
//! answers land in the transcript in arrival order.

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::client::AskClient;
use crate::error::{AskError, HandlerFault};
use crate::form::ChatForm;
use crate::transcript::{ChatMessage, Transcript};
use crate::tui::AppEvent;

/// Monotonic id assigned to each submission.
pub type RequestId = u64;

/// Outcome of one ask request, tagged with the submission that issued it.
#[derive(Debug)]
pub struct AskReply {
    pub id: RequestId,
    pub outcome: Result<String, AskError>,
}

pub struct ChatFormHandler {
    client: AskClient,
    events: UnboundedSender<AppEvent>,
    next_id: RequestId,
    in_flight: usize,
    newest_applied: Option<RequestId>,
    drop_stale: bool,
}

impl ChatFormHandler {
    pub fn new(client: AskClient, events: UnboundedSender<AppEvent>, drop_stale: bool) -> Self {
        Self {
            client,
            events,
            next_id: 1,
            in_flight: 0,
            newest_applied: None,
            drop_stale,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Handle a form submit. Returns the id of the issued request, if any.
    ///
    /// Never fails: blank input is ignored and faults are logged.
    pub fn on_submit(&mut self, form: &mut ChatForm, transcript: &mut Transcript) -> Option<RequestId> {
        debug!("form submission detected");
        match self.submit(form, transcript) {
            Ok(id) => id,
            Err(fault) => {
                error!(error = %fault, "an error occurred during form submission");
                None
            }
        }
    }

    fn submit(
        &mut self,
        form: &mut ChatForm,
        transcript: &mut Transcript,
    ) -> Result<Option<RequestId>, HandlerFault> {
        debug!("default form submission prevented");

        if form.value().trim().is_empty() {
            return Ok(None);
        }

        // Fail before touching the form or transcript
        let runtime = Handle::try_current()?;
        if self.events.is_closed() {
            return Err(HandlerFault::EventLoopClosed);
        }

        let query = form.take();
        transcript.push(ChatMessage::you(query.clone()));

        let id = self.next_id;
        self.next_id += 1;
        self.in_flight += 1;

        let client = self.client.clone();
        let events = self.events.clone();
        runtime.spawn(async move {
            let outcome = client.ask(&query).await;
            if events.send(AppEvent::Answer(AskReply { id, outcome })).is_err() {
                debug!(request_id = id, "event loop closed before answer arrived");
            }
        });

        info!(request_id = id, endpoint = %self.client.endpoint(), "ask request sent");
        Ok(Some(id))
    }

    /// Apply a request's outcome to the transcript.
    pub fn on_reply(&mut self, reply: AskReply, transcript: &mut Transcript) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.drop_stale && self.newest_applied.is_some_and(|newest| reply.id < newest) {
            warn!(request_id = reply.id, "dropping stale answer");
            return;
        }

        match reply.outcome {
            Ok(answer) => {
                info!(request_id = reply.id, "answer received");
                transcript.push(ChatMessage::ai(answer));
            }
            Err(err) if err.is_request_failure() => {
                warn!(request_id = reply.id, error = %err, "ask request failed");
                transcript.push(ChatMessage::fallback());
            }
            Err(err) => {
                // Malformed success body: logged only, the transcript is left alone
                error!(request_id = reply.id, error = %err, "failed to parse answer");
                return;
            }
        }

        self.newest_applied = Some(self.newest_applied.map_or(reply.id, |n| n.max(reply.id)));
        transcript.scroll_to_bottom();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::FALLBACK_ANSWER;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn handler(base_url: &str, drop_stale: bool) -> (ChatFormHandler, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = AskClient::new(base_url, "/ask", None).unwrap();
        (ChatFormHandler::new(client, tx, drop_stale), rx)
    }

    fn small_transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.set_viewport(40, 2);
        transcript
    }

    async fn next_reply(rx: &mut UnboundedReceiver<AppEvent>) -> AskReply {
        match rx.recv().await {
            Some(AppEvent::Answer(reply)) => reply,
            other => panic!("expected an answer event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (mut handler, mut rx) = handler("http://127.0.0.1:9", false);
        let mut transcript = small_transcript();

        for blank in ["", "   ", "\t \n"] {
            let mut form = ChatForm::new();
            form.set_value(blank);
            assert_eq!(handler.on_submit(&mut form, &mut transcript), None);
            assert_eq!(form.value(), blank);
        }

        assert!(transcript.is_empty());
        assert_eq!(handler.in_flight(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_echoes_untrimmed_text_and_clears_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body(r#"{"answer": "42"}"#)
            .expect(1)
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("  meaning of life ");

        let id = handler.on_submit(&mut form, &mut transcript);

        assert_eq!(id, Some(1));
        assert_eq!(form.value(), "");
        assert_eq!(transcript.entries(), vec!["You:   meaning of life "]);
        assert_eq!(handler.in_flight(), 1);

        let reply = next_reply(&mut rx).await;
        handler.on_reply(reply, &mut transcript);

        assert_eq!(transcript.entries(), vec!["You:   meaning of life ", "AI: 42"]);
        assert_eq!(handler.in_flight(), 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_answer_scrolls_to_bottom() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body(r#"{"answer": "42"}"#)
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        for i in 0..4 {
            transcript.push(ChatMessage::ai(format!("earlier {i}")));
        }

        let mut form = ChatForm::new();
        form.set_value("question");
        handler.on_submit(&mut form, &mut transcript);
        let reply = next_reply(&mut rx).await;
        handler.on_reply(reply, &mut transcript);

        assert_eq!(transcript.entries().last().unwrap(), "AI: 42");
        assert_eq!(transcript.scroll(), transcript.max_scroll());
        assert_eq!(transcript.scroll(), 4);
    }

    #[tokio::test]
    async fn test_failed_request_shows_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ask")
            .with_status(500)
            .with_body(r#"{"error": "Server error"}"#)
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("hello");

        handler.on_submit(&mut form, &mut transcript);
        let reply = next_reply(&mut rx).await;
        handler.on_reply(reply, &mut transcript);

        assert_eq!(
            transcript.entries(),
            vec![
                "You: hello".to_string(),
                format!("AI: {FALLBACK_ANSWER}"),
            ]
        );
        assert_eq!(form.value(), "");
    }

    #[tokio::test]
    async fn test_unreachable_server_shows_fallback() {
        let (mut handler, mut rx) = handler("http://127.0.0.1:9", false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("hello");

        handler.on_submit(&mut form, &mut transcript);
        let reply = next_reply(&mut rx).await;
        handler.on_reply(reply, &mut transcript);

        assert_eq!(transcript.entries()[1], format!("AI: {FALLBACK_ANSWER}"));
    }

    #[tokio::test]
    async fn test_malformed_success_body_adds_no_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body("definitely not json")
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("hello");

        handler.on_submit(&mut form, &mut transcript);
        let reply = next_reply(&mut rx).await;
        handler.on_reply(reply, &mut transcript);

        assert_eq!(transcript.entries(), vec!["You: hello"]);
        assert_eq!(handler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_answers_apply_in_arrival_order() {
        let (mut handler, _rx) = handler("http://127.0.0.1:9", false);
        let mut transcript = small_transcript();

        handler.on_reply(AskReply { id: 2, outcome: Ok("second".into()) }, &mut transcript);
        handler.on_reply(AskReply { id: 1, outcome: Ok("first".into()) }, &mut transcript);

        assert_eq!(transcript.entries(), vec!["AI: second", "AI: first"]);
    }

    #[tokio::test]
    async fn test_slow_first_answer_lands_after_second() {
        let mut server = mockito::Server::new_async().await;
        let slow = server
            .mock("POST", "/ask")
            .match_body(Matcher::Json(json!({ "query": "one" })))
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(400));
                w.write_all(br#"{"answer": "first"}"#)
            })
            .create_async()
            .await;
        let fast = server
            .mock("POST", "/ask")
            .match_body(Matcher::Json(json!({ "query": "two" })))
            .with_status(200)
            .with_body(r#"{"answer": "second"}"#)
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();

        form.set_value("one");
        handler.on_submit(&mut form, &mut transcript);
        form.set_value("two");
        handler.on_submit(&mut form, &mut transcript);

        let first_arrival = next_reply(&mut rx).await;
        assert_eq!(first_arrival.id, 2);
        handler.on_reply(first_arrival, &mut transcript);
        let second_arrival = next_reply(&mut rx).await;
        assert_eq!(second_arrival.id, 1);
        handler.on_reply(second_arrival, &mut transcript);

        assert_eq!(
            transcript.entries(),
            vec!["You: one", "You: two", "AI: second", "AI: first"]
        );
        slow.assert_async().await;
        fast.assert_async().await;
    }

    #[tokio::test]
    async fn test_stale_answers_dropped_when_enabled() {
        let (mut handler, _rx) = handler("http://127.0.0.1:9", true);
        let mut transcript = small_transcript();

        handler.on_reply(AskReply { id: 2, outcome: Ok("second".into()) }, &mut transcript);
        handler.on_reply(AskReply { id: 1, outcome: Ok("first".into()) }, &mut transcript);
        handler.on_reply(AskReply { id: 3, outcome: Ok("third".into()) }, &mut transcript);

        assert_eq!(transcript.entries(), vec!["AI: second", "AI: third"]);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_each_send_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_body(r#"{"answer": "ok"}"#)
            .expect(2)
            .create_async()
            .await;

        let (mut handler, mut rx) = handler(&server.url(), false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();

        form.set_value("one");
        let first = handler.on_submit(&mut form, &mut transcript);
        form.set_value("two");
        let second = handler.on_submit(&mut form, &mut transcript);

        assert_eq!((first, second), (Some(1), Some(2)));
        assert_eq!(handler.in_flight(), 2);

        for _ in 0..2 {
            let reply = next_reply(&mut rx).await;
            handler.on_reply(reply, &mut transcript);
        }

        assert_eq!(transcript.entries(), vec!["You: one", "You: two", "AI: ok", "AI: ok"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_closed_event_loop_is_a_silent_fault() {
        let (mut handler, rx) = handler("http://127.0.0.1:9", false);
        drop(rx);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("hello");

        assert_eq!(handler.on_submit(&mut form, &mut transcript), None);
        assert!(transcript.is_empty());
        assert_eq!(form.value(), "hello");
    }

    #[test]
    fn test_submit_without_runtime_is_a_silent_fault() {
        let (mut handler, _rx) = handler("http://127.0.0.1:9", false);
        let mut transcript = small_transcript();
        let mut form = ChatForm::new();
        form.set_value("hello");

        assert_eq!(handler.on_submit(&mut form, &mut transcript), None);
        assert!(transcript.is_empty());
        assert_eq!(form.value(), "hello");
        assert_eq!(handler.in_flight(), 0);
    }
}
