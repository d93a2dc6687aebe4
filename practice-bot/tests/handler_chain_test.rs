//! Integration tests for [`practice_bot::HandlerChain`].
//!
//! Covers: before/after ordering, a before hook stopping the chain, Stop ending the handle
//! phase, and after hooks receiving the final response in reverse order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use practice_bot::core::{Chat, Event, EventKind, Handler, HandlerResponse, User};
use practice_bot::HandlerChain;

fn create_test_event(content: &str) -> Event {
    Event::new(
        "test_event_id",
        User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        Chat::private(456),
        EventKind::Text(content.to_string()),
    )
}

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    response: HandlerResponse,
}

#[async_trait::async_trait]
impl Handler for Recorder {
    async fn before(&self, _event: &Event) -> practice_bot::core::Result<bool> {
        self.log.lock().unwrap().push(format!("before:{}", self.name));
        Ok(true)
    }

    async fn handle(&self, _event: &Event) -> practice_bot::core::Result<HandlerResponse> {
        self.log.lock().unwrap().push(format!("handle:{}", self.name));
        Ok(self.response.clone())
    }

    async fn after(&self, _event: &Event, response: &HandlerResponse) -> practice_bot::core::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("after:{}:{:?}", self.name, response));
        Ok(())
    }
}

/// **Test: before runs first→last, handle stops at Stop, after runs last→first with Stop.**
#[tokio::test]
async fn test_chain_order_and_stop() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(Recorder { name: "a", log: log.clone(), response: HandlerResponse::Continue }))
        .add_handler(Arc::new(Recorder { name: "b", log: log.clone(), response: HandlerResponse::Stop }))
        .add_handler(Arc::new(Recorder { name: "c", log: log.clone(), response: HandlerResponse::Continue }));

    let result = chain.handle(&create_test_event("hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "before:a", "before:b", "before:c",
            "handle:a", "handle:b",
            "after:c:Stop", "after:b:Stop", "after:a:Stop",
        ]
    );
}

/// **Test: a before hook returning false stops the chain; no handle runs.**
#[tokio::test]
async fn test_before_false_stops_chain() {
    struct Blocking;

    #[async_trait::async_trait]
    impl Handler for Blocking {
        async fn before(&self, _event: &Event) -> practice_bot::core::Result<bool> {
            Ok(false)
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Handler for Counting {
        async fn handle(&self, _event: &Event) -> practice_bot::core::Result<HandlerResponse> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerResponse::Continue)
        }
    }

    let count = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(Blocking))
        .add_handler(Arc::new(Counting(count.clone())));

    let result = chain.handle(&create_test_event("hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

/// **Test: an empty chain returns Continue.**
#[tokio::test]
async fn test_empty_chain_continues() {
    let chain = HandlerChain::new();
    assert_eq!(chain.handle(&create_test_event("x")).await.unwrap(), HandlerResponse::Continue);
}
