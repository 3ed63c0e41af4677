use async_trait::async_trait;
use brainstorm_application::DiagramUseCase;
use brainstorm_core::config::BrainstormConfig;
use brainstorm_core::element::shapes;
use brainstorm_core::generator::{Generator, GeneratorRequest, GeneratorRole, RawOutput};
use brainstorm_core::session::MessageRole;
use brainstorm_core::{BrainstormError, Result};
use std::sync::{Arc, Mutex};

/// Classifier answers come from `intent`; every other role gets `reply`.
struct RoutingGenerator {
    intent: Result<RawOutput>,
    reply: String,
    requests: Mutex<Vec<GeneratorRequest>>,
}

impl RoutingGenerator {
    fn new(intent: Result<RawOutput>, reply: &str) -> Self {
        Self {
            intent,
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn answered_by(&self) -> Vec<GeneratorRole> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.role)
            .filter(|role| *role != GeneratorRole::IntentClassifier)
            .collect()
    }

    fn last_request(&self) -> GeneratorRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Generator for RoutingGenerator {
    async fn invoke(&self, request: GeneratorRequest) -> Result<RawOutput> {
        let role = request.role;
        self.requests.lock().unwrap().push(request);
        match role {
            GeneratorRole::IntentClassifier => self.intent.clone(),
            _ => Ok(RawOutput::from(self.reply.as_str())),
        }
    }
}

async fn setup(generator: Arc<RoutingGenerator>) -> DiagramUseCase {
    let usecase = DiagramUseCase::new(generator, &BrainstormConfig::default());
    usecase.open_session("conn-1").await;
    usecase
}

#[tokio::test]
async fn test_free_chat_merges_structured_elements_only() {
    let generator = Arc::new(RoutingGenerator::new(
        Ok(RawOutput::from("{}")),
        r#"{"reply": "Added a queue", "elements": [{"type": "rectangle", "text": "Jobs"}]}"#,
    ));
    let usecase = setup(generator).await;

    let outcome = usecase.free_chat("conn-1", "add a job queue", 6).await.unwrap();
    assert_eq!(outcome.reply, "Added a queue");
    assert_eq!(outcome.new_elements.len(), 2);

    let (steps, current_step, plan_complete) = usecase.plan_status("conn-1").await.unwrap();
    assert!(steps.is_empty());
    assert_eq!((current_step, plan_complete), (0, false));
}

#[tokio::test]
async fn test_free_chat_has_no_fallback() {
    let generator = Arc::new(RoutingGenerator::new(
        Ok(RawOutput::from("{}")),
        "Sure, a user box would fit on the left.",
    ));
    let usecase = setup(generator).await;

    let outcome = usecase.free_chat("conn-1", "Add a user", 6).await.unwrap();
    assert_eq!(outcome.reply, "Sure, a user box would fit on the left.");
    assert!(outcome.new_elements.is_empty());
    assert!(usecase.elements("conn-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_free_chat_sends_history_tail_and_records_messages() {
    let generator = Arc::new(RoutingGenerator::new(
        Ok(RawOutput::from("{}")),
        r#"{"reply": "ok", "elements": []}"#,
    ));
    let usecase = setup(generator.clone()).await;

    usecase.free_chat("conn-1", "first", 6).await.unwrap();
    usecase.free_chat("conn-1", "second", 1).await.unwrap();

    assert_eq!(generator.last_request().history, "assistant: ok");
    let handle = usecase.sessions().get("conn-1").await.unwrap();
    let session = handle.lock().await;
    let senders: Vec<MessageRole> = session.chat_history.iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );
}

#[tokio::test]
async fn test_chat_intent_routes_to_free_chat() {
    let generator = Arc::new(RoutingGenerator::new(
        Ok(RawOutput::from(r#"{"intent": "chat", "type": "chat"}"#)),
        r#"{"reply": "hello", "elements": []}"#,
    ));
    let usecase = setup(generator.clone()).await;

    let outcome = usecase.handle_message("conn-1", "hi there", Vec::new()).await.unwrap();
    assert_eq!(outcome.reply, "hello");
    assert_eq!(generator.answered_by(), vec![GeneratorRole::FreeChat]);
}

#[tokio::test]
async fn test_think_and_unknown_intents_route_to_executor() {
    for intent in [
        r#"{"intent": "add database", "type": "think"}"#,
        r#"{"intent": "draw", "type": "sketch"}"#,
        "not json at all",
    ] {
        let generator = Arc::new(RoutingGenerator::new(
            Ok(RawOutput::from(intent)),
            r#"{"reply": "done", "elements": [{"type": "ellipse", "text": "DB"}]}"#,
        ));
        let usecase = setup(generator.clone()).await;

        let outcome = usecase.handle_message("conn-1", "add a db", Vec::new()).await.unwrap();
        assert_eq!(generator.answered_by(), vec![GeneratorRole::StepExecutor], "{intent}");
        assert_eq!(shapes(&outcome.new_elements).count(), 1);
    }
}

#[tokio::test]
async fn test_unavailable_classifier_routes_to_executor() {
    let generator = Arc::new(RoutingGenerator::new(
        Err(BrainstormError::unavailable("classifier down")),
        r#"{"reply": "done", "elements": []}"#,
    ));
    let usecase = setup(generator.clone()).await;

    usecase.handle_message("conn-1", "add a db", vec![vec![1, 2, 3]]).await.unwrap();
    assert_eq!(generator.answered_by(), vec![GeneratorRole::StepExecutor]);
    assert_eq!(generator.last_request().images, vec![vec![1u8, 2, 3]]);
}
