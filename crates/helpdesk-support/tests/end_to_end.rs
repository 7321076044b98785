//! Full conversations through `ChatService` with a scripted model.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use helpdesk_rs::agent::outcome::FailureKind;
use helpdesk_rs::agent::session::ChatService;
use helpdesk_rs::clock::FixedClock;
use helpdesk_rs::error::AdapterError;
use helpdesk_rs::{
    ChatCompletion, ChatModel, ChatRequest, Message, MessageRole, ModelFuture, ToolCall,
};
use helpdesk_support::SupportConfig;
use serde_json::{Value, json};

type Responder = dyn Fn(&ChatRequest) -> Result<ChatCompletion, AdapterError> + Send + Sync;

/// Answers each request with a closure and keeps every request it saw.
struct ScriptedModel {
    respond: Box<Responder>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(
        respond: impl Fn(&ChatRequest) -> Result<ChatCompletion, AdapterError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatModel for ScriptedModel {
    fn chat<'a>(&'a self, body: &'a ChatRequest) -> ModelFuture<'a> {
        self.requests.lock().unwrap().push(body.clone());
        let result = (self.respond)(body);
        Box::pin(async move { result })
    }
}

/// Calls `tool` with `args` for a fresh utterance, then answers with
/// `answer(observation)` once the tool result is in.
fn tool_then_answer(
    tool: &'static str,
    args: Value,
    answer: impl Fn(&Value) -> String + Send + Sync + 'static,
) -> Arc<ScriptedModel> {
    ScriptedModel::new(move |req| {
        let last = req.messages.last().unwrap();
        if last.role == MessageRole::Tool {
            let observation: Value =
                serde_json::from_str(last.content.as_deref().unwrap()).unwrap();
            Ok(ChatCompletion::text(answer(&observation)))
        } else {
            Ok(ChatCompletion::tool_calls(vec![ToolCall::function(
                "call_1",
                tool,
                args.to_string(),
            )]))
        }
    })
}

fn service(model: Arc<ScriptedModel>) -> ChatService {
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()));
    SupportConfig::default().build_service(model, clock).unwrap()
}

fn user_texts(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .filter_map(|m| m.content.clone())
        .collect()
}

#[tokio::test]
async fn order_status_question() {
    let model = tool_then_answer("get_order_status", json!({"order_id": "123456"}), |obs| {
        format!(
            "Siparişinizin durumu: {}",
            obs["payload"]["status"].as_str().unwrap()
        )
    });
    let service = service(model.clone());

    let reply = service
        .handle_user_utterance("s1", "123456 sipariş numaralı siparişimin durumu nedir?")
        .await;

    assert!(reply.failure.is_none());
    assert!(reply.final_text.contains("Hazırlanıyor"));
    assert_eq!(reply.steps.len(), 1);
    assert_eq!(reply.steps[0].tool_name(), "get_order_status");
    assert_eq!(reply.steps[0].result.field("status"), Some(&json!("Hazırlanıyor")));
    assert_eq!(model.requests().len(), 2);

    // The system prompt carries today's and tomorrow's dates.
    let first = &model.requests()[0];
    let system = first.messages[0].content.as_deref().unwrap();
    assert!(system.contains("2024-03-20"));
    assert!(system.contains("2024-03-21"));
    assert_eq!(first.tools.as_ref().map(Vec::len), Some(4));
}

#[tokio::test]
async fn appointment_for_tomorrow_afternoon() {
    let model = tool_then_answer(
        "schedule_appointment",
        json!({"preferred_date": "yarın", "preferred_time": "14:00"}),
        |obs| obs["message"].as_str().unwrap().to_string(),
    );
    let service = service(model);

    let reply = service
        .handle_user_utterance("s1", "Yarın saat 14:00 için servis randevusu alabilir miyim?")
        .await;

    assert!(reply.failure.is_none());
    let step = &reply.steps[0];
    assert_eq!(step.argument("preferred_date"), Some("2024-03-21"));
    assert_eq!(step.argument("preferred_time"), Some("14:00"));
    assert_eq!(step.argument("service_type"), Some("Genel Servis"));
    assert_eq!(
        reply.final_text,
        "2024-03-21 tarihinde saat 14:00 için Genel Servis randevunuz oluşturulmuştur."
    );
}

#[tokio::test]
async fn store_without_location_asks_for_city() {
    let model = tool_then_answer(
        "find_nearest_store",
        json!({"location": "my location"}),
        |obs| {
            assert_eq!(obs["success"], false);
            obs["message"].as_str().unwrap().to_string()
        },
    );
    let service = service(model);

    let reply = service
        .handle_user_utterance("s1", "En yakın mağaza nerede?")
        .await;

    assert!(reply.failure.is_none());
    assert_eq!(reply.steps[0].result.field("needs_location"), Some(&json!(true)));
    assert!(reply.final_text.contains("şehir"));
}

#[tokio::test]
async fn history_reaches_the_next_utterance() {
    let model = ScriptedModel::new(|req| {
        let users = user_texts(&req.messages);
        Ok(ChatCompletion::text(format!("{} mesaj gördüm", users.len())))
    });
    let service = service(model.clone());

    let first = service.handle_user_utterance("s1", "Merhaba").await;
    assert_eq!(first.final_text, "1 mesaj gördüm");
    let second = service.handle_user_utterance("s1", "Bir sorum var").await;
    assert_eq!(second.final_text, "2 mesaj gördüm");

    // Another session starts from scratch.
    let other = service.handle_user_utterance("s2", "Selam").await;
    assert_eq!(other.final_text, "1 mesaj gördüm");

    let turns = service.history("s1").await;
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[2].text(), "Bir sorum var");
}

#[tokio::test]
async fn repeated_store_failures_get_store_coaching() {
    let model = ScriptedModel::new(|_| {
        Err(AdapterError::ToolUseFailed {
            tool: Some("find_nearest_store".into()),
            detail: "Failed to call a function".into(),
        })
    });
    let service = service(model.clone());

    let reply = service
        .handle_user_utterance("s1", "Bana en yakın mağazayı bul")
        .await;

    assert_eq!(reply.failure, Some(FailureKind::AdapterExhausted));
    assert!(reply.final_text.contains("şehri veya semti"));
    // One attempt plus two retries, each retry carrying the clarification.
    let requests = model.requests();
    assert_eq!(requests.len(), 3);
    let last_users = user_texts(&requests[2].messages);
    assert!(last_users.last().unwrap().contains("2024-03-21"));

    // The apology is recorded so the next turn has context.
    let turns = service.history("s1").await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].text(), reply.final_text);
}

#[tokio::test]
async fn endless_tool_calls_hit_the_round_limit() {
    let model = ScriptedModel::new(|_| {
        Ok(ChatCompletion::tool_calls(vec![ToolCall::function(
            "c",
            "get_order_status",
            r#"{"order_id":"867530"}"#,
        )]))
    });
    let service = service(model.clone());

    let reply = service
        .handle_user_utterance("s1", "Siparişim 867530 nerede?")
        .await;

    assert_eq!(reply.failure, Some(FailureKind::RoundLimitExceeded));
    assert_eq!(model.requests().len(), 3);
    assert_eq!(reply.steps.len(), 3);
    assert!(reply.final_text.starts_with("Üzgünüm"));
}
