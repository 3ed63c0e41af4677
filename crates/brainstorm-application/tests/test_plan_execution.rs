use async_trait::async_trait;
use brainstorm_application::DiagramUseCase;
use brainstorm_core::config::BrainstormConfig;
use brainstorm_core::element::{Element, Shape, shapes};
use brainstorm_core::generator::{Generator, GeneratorRequest, GeneratorRole, RawOutput};
use brainstorm_core::plan::GENERIC_STEP;
use brainstorm_core::{BrainstormError, Result};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers each role from its own queue and records every request.
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<HashMap<GeneratorRole, VecDeque<Result<RawOutput>>>>,
    requests: Mutex<Vec<GeneratorRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn push(&self, role: GeneratorRole, reply: Result<RawOutput>) {
        self.replies
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(reply);
    }

    fn reply(&self, role: GeneratorRole, text: &str) {
        self.push(role, Ok(RawOutput::from(text)));
    }

    fn roles_called(&self) -> Vec<GeneratorRole> {
        self.requests.lock().unwrap().iter().map(|r| r.role).collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn invoke(&self, request: GeneratorRequest) -> Result<RawOutput> {
        let role = request.role;
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .get_mut(&role)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(RawOutput::from(r#"{"reply": "", "elements": []}"#)))
    }
}

async fn setup(generator: Arc<ScriptedGenerator>) -> DiagramUseCase {
    let usecase = DiagramUseCase::new(generator, &BrainstormConfig::default());
    usecase.open_session("conn-1").await;
    usecase
}

fn shape_labels(elements: &[Element]) -> Vec<String> {
    shapes(elements).map(|shape| shape.label.clone()).collect()
}

fn connector_pairs(elements: &[Element]) -> Vec<(String, String)> {
    elements
        .iter()
        .filter_map(Element::as_connector)
        .map(|c| (c.start_ref.clone(), c.end_ref.clone()))
        .collect()
}

#[tokio::test]
async fn test_three_step_plan_end_to_end() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.push(
        GeneratorRole::StepPlanner,
        Ok(RawOutput::from(json!({
            "steps": ["Add a user", "Add a load balancer", "Connect user to load balancer"]
        }))),
    );
    let usecase = setup(generator.clone()).await;

    let plan = usecase.request_plan("conn-1", "Design a web app").await.unwrap();
    assert_eq!(plan.steps.len(), 3);

    let first = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!((first.next_step_index, first.plan_complete), (1, false));
    let second = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!((second.next_step_index, second.plan_complete), (2, false));
    let third = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!((third.next_step_index, third.plan_complete), (3, true));

    let elements = usecase.elements("conn-1").await.unwrap();
    assert_eq!(shape_labels(&elements), vec!["User", "Load Balancer"]);

    let shapes: Vec<&Shape> = shapes(&elements).collect();
    assert_eq!(
        connector_pairs(&elements),
        vec![(shapes[0].id.clone(), shapes[1].id.clone())]
    );

    let (_, current_step, plan_complete) = usecase.plan_status("conn-1").await.unwrap();
    assert_eq!(current_step, 3);
    assert!(plan_complete);
}

#[tokio::test]
async fn test_step_after_completion_is_a_no_op() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add a cache"]}"#);
    let usecase = setup(generator.clone()).await;

    usecase.request_plan("conn-1", "cache it").await.unwrap();
    usecase.execute_next_step("conn-1").await.unwrap();
    let calls_before = generator.roles_called().len();

    let outcome = usecase.execute_next_step("conn-1").await.unwrap();
    assert!(outcome.plan_complete);
    assert!(outcome.new_elements.is_empty());
    assert_eq!(outcome.next_step_index, 1);
    assert_eq!(generator.roles_called().len(), calls_before);
    assert_eq!(usecase.elements("conn-1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_generator_failure_leaves_step_for_retry() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add a user", "Add a database"]}"#);
    generator.push(
        GeneratorRole::StepExecutor,
        Err(BrainstormError::unavailable("connection refused")),
    );
    let usecase = setup(generator.clone()).await;
    usecase.request_plan("conn-1", "users and data").await.unwrap();

    let err = usecase.execute_next_step("conn-1").await.unwrap_err();
    match err {
        BrainstormError::StepFailed {
            step_index,
            plan_complete,
            ref message,
        } => {
            assert_eq!(step_index, 0);
            assert!(!plan_complete);
            assert!(message.contains("connection refused"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let (_, current_step, plan_complete) = usecase.plan_status("conn-1").await.unwrap();
    assert_eq!((current_step, plan_complete), (0, false));
    assert!(usecase.elements("conn-1").await.unwrap().is_empty());

    let retry = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!(shape_labels(&retry.new_elements), vec!["User"]);
    assert_eq!(retry.next_step_index, 1);
}

#[tokio::test]
async fn test_structured_reply_is_preferred_over_fallback() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add storage"]}"#);
    let inner = json!({
        "reply": "Added object storage",
        "elements": [{"type": "rectangle", "x": 400, "y": 300, "text": "S3 Bucket"}],
    });
    let encoded = serde_json::to_string(&inner.to_string()).unwrap();
    generator.reply(GeneratorRole::StepExecutor, &encoded);
    let usecase = setup(generator).await;
    usecase.request_plan("conn-1", "store files").await.unwrap();

    let outcome = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!(outcome.reply, "Added object storage");
    assert_eq!(shape_labels(&outcome.new_elements), vec!["S3 Bucket"]);
    let shape = outcome.new_elements[0].as_shape().unwrap();
    assert_eq!((shape.x, shape.y), (400.0, 300.0));
}

#[tokio::test]
async fn test_fresh_plan_replaces_previous_plan() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add a user", "Add a cache"]}"#);
    generator.reply(GeneratorRole::StepPlanner, "1. Add a database\n2. Add a queue");
    let usecase = setup(generator).await;

    usecase.request_plan("conn-1", "first").await.unwrap();
    usecase.execute_next_step("conn-1").await.unwrap();

    let plan = usecase.request_plan("conn-1", "second").await.unwrap();
    assert_eq!(plan.steps, vec!["Add a database", "Add a queue"]);
    let (steps, current_step, plan_complete) = usecase.plan_status("conn-1").await.unwrap();
    assert_eq!(steps, plan.steps);
    assert_eq!((current_step, plan_complete), (0, false));

    let outcome = usecase.execute_next_step("conn-1").await.unwrap();
    assert_eq!(shape_labels(&outcome.new_elements), vec!["Database"]);
    // The earlier User shape stays on the board and chains into the new one.
    assert_eq!(connector_pairs(&outcome.new_elements).len(), 1);
}

#[tokio::test]
async fn test_echoed_plan_becomes_generic_step() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, "Build a login system");
    let usecase = setup(generator).await;

    let plan = usecase.request_plan("conn-1", "Build a login system").await.unwrap();
    assert_eq!(plan.steps, vec![GENERIC_STEP]);

    // The executor answers with nothing; the step still draws a shape.
    let outcome = usecase.execute_next_step("conn-1").await.unwrap();
    assert!(outcome.plan_complete);
    assert_eq!(shape_labels(&outcome.new_elements), vec![GENERIC_STEP]);
}

#[tokio::test]
async fn test_echo_of_long_request_becomes_generic_step() {
    let request = format!("Design {}", "a large system ".repeat(200));
    assert!(request.chars().count() > BrainstormConfig::default().limits.user_text_chars);

    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, request.trim());
    let usecase = setup(generator.clone()).await;

    let plan = usecase.request_plan("conn-1", &request).await.unwrap();
    assert_eq!(plan.steps, vec![GENERIC_STEP]);
}

#[tokio::test]
async fn test_planner_failure_keeps_prior_plan() {
    let generator = Arc::new(ScriptedGenerator::new());
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add a user"]}"#);
    generator.push(GeneratorRole::StepPlanner, Err(BrainstormError::unavailable("HTTP 500")));
    let usecase = setup(generator).await;

    usecase.request_plan("conn-1", "first").await.unwrap();
    let err = usecase.request_plan("conn-1", "second").await.unwrap_err();
    assert!(err.is_unavailable());

    let (steps, current_step, _) = usecase.plan_status("conn-1").await.unwrap();
    assert_eq!(steps, vec!["Add a user"]);
    assert_eq!(current_step, 0);
    usecase.execute_next_step("conn-1").await.unwrap();
}

#[tokio::test]
async fn test_step_without_plan() {
    let usecase = setup(Arc::new(ScriptedGenerator::new())).await;
    assert!(matches!(
        usecase.execute_next_step("conn-1").await,
        Err(BrainstormError::NoPlan)
    ));
}

#[tokio::test]
async fn test_unknown_session() {
    let usecase = setup(Arc::new(ScriptedGenerator::new())).await;
    let err = usecase.request_plan("nobody", "hi").await.unwrap_err();
    assert!(err.is_not_found());

    assert!(usecase.close_session("conn-1").await);
    assert!(usecase.elements("conn-1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_slow_generator_times_out_as_step_failure() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(200)));
    generator.reply(GeneratorRole::StepPlanner, r#"{"steps": ["Add a user"]}"#);
    let usecase = DiagramUseCase::new(generator, &BrainstormConfig::default())
        .with_call_timeout(Some(Duration::from_secs(5)));
    usecase.open_session("conn-1").await;
    usecase.request_plan("conn-1", "draw it").await.unwrap();

    let usecase = usecase.with_call_timeout(Some(Duration::from_millis(20)));
    let err = usecase.execute_next_step("conn-1").await.unwrap_err();
    assert!(err.is_step_failed());
    assert!(err.to_string().contains("timed out"));

    let (_, current_step, _) = usecase.plan_status("conn-1").await.unwrap();
    assert_eq!(current_step, 0);
}
