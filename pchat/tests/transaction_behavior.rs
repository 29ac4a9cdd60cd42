use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{StreamExt, stream};
use pchat::{
    ChatConfig, ChatErrorKind, ChatEvent, ChatEventStream, ChatObserver, ChatService, UserPrompt,
    channel_observer,
};
use pprovider::{
    AssistantBody, ChatRequest, ChunkStream, CompletionChunk, CompletionTransport, FinishReason,
    Message, ProviderError, ProviderFuture, RequestPhase, VecChunkStream,
};
use ptooling::{FunctionDescriptor, ParameterDescriptor, ToolError, required_string};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

type Script = Vec<Result<CompletionChunk, ProviderError>>;

#[derive(Debug, Default)]
struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl CompletionTransport for ScriptedTransport {
    fn stream<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let script = self
                .scripts
                .lock()
                .expect("scripts lock")
                .pop_front()
                .ok_or_else(|| ProviderError::unavailable("no script left"))?;
            Ok(Box::pin(VecChunkStream::new(script)) as ChunkStream<'a>)
        })
    }
}

#[derive(Debug)]
struct ChannelTransport {
    receiver: Mutex<Option<UnboundedReceiver<Result<CompletionChunk, ProviderError>>>>,
}

fn channel_transport() -> (
    Arc<ChannelTransport>,
    UnboundedSender<Result<CompletionChunk, ProviderError>>,
) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        Arc::new(ChannelTransport {
            receiver: Mutex::new(Some(receiver)),
        }),
        sender,
    )
}

impl CompletionTransport for ChannelTransport {
    fn stream<'a>(
        &'a self,
        _request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let receiver = self
                .receiver
                .lock()
                .expect("receiver lock")
                .take()
                .ok_or_else(|| ProviderError::unavailable("channel already consumed"))?;
            let chunks = stream::unfold(receiver, |mut receiver| async move {
                receiver.recv().await.map(|item| (item, receiver))
            });
            Ok(Box::pin(chunks) as ChunkStream<'a>)
        })
    }
}

#[derive(Default)]
struct Recording(Mutex<Vec<ChatEvent>>);

impl Recording {
    fn events(&self) -> Vec<ChatEvent> {
        self.0.lock().expect("events lock").clone()
    }

    fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(ChatEvent::name).collect()
    }
}

impl ChatObserver for Recording {
    fn on_event(&self, event: &ChatEvent) {
        self.0.lock().expect("events lock").push(event.clone());
    }
}

fn text_reply(parts: &[&str]) -> Script {
    parts
        .iter()
        .map(|part| Ok(CompletionChunk::content(*part)))
        .chain(std::iter::once(Ok(CompletionChunk::finish(FinishReason::Stop))))
        .collect()
}

fn call_reply(name: &str, arguments: Option<&str>) -> Script {
    vec![
        Ok(CompletionChunk::function_call(Some(name), arguments)),
        Ok(CompletionChunk::finish(FinishReason::FunctionCall)),
    ]
}

fn service_with(
    transport: Arc<dyn CompletionTransport>,
    config: ChatConfig,
) -> (ChatService, Arc<Recording>) {
    let recording = Arc::new(Recording::default());
    let service = ChatService::builder(transport)
        .config(config)
        .observer(recording.clone())
        .build()
        .expect("service should build");
    (service, recording)
}

fn assistant_text(message: &Message) -> Option<&str> {
    message.as_assistant().and_then(|assistant| assistant.content())
}

async fn next_matching(
    events: &mut ChatEventStream<'static>,
    predicate: impl Fn(&ChatEvent) -> bool,
) -> ChatEvent {
    while let Some(event) = events.next().await {
        if predicate(&event) {
            return event;
        }
    }
    panic!("event stream ended before a matching event");
}

#[tokio::test]
async fn plain_answer_is_streamed_and_appended() {
    let transport = ScriptedTransport::new(vec![text_reply(&["Hi", " there"])]);
    let (service, recording) = service_with(transport.clone(), ChatConfig::default());

    assert!(service.send_user_prompt("Hello").await);

    let history = service.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].as_user().map(|user| user.content.as_str()), Some("Hello"));
    assert_eq!(assistant_text(&history[1]), Some("Hi there"));
    assert!(!service.is_turn_in_progress());

    assert_eq!(
        recording.names(),
        vec![
            "user_request",
            "user_prompt_echo",
            "content_delta",
            "content_delta",
            "turn_finished"
        ]
    );

    let events = recording.events();
    let delta_ids = events
        .iter()
        .filter_map(|event| match event {
            ChatEvent::ContentDelta { message_id, .. } => Some(message_id.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(delta_ids[0], delta_ids[1]);
    assert_eq!(&delta_ids[0], history[1].id());
    assert_eq!(
        events.last(),
        Some(&ChatEvent::TurnFinished {
            message_id: history[1].id().clone()
        })
    );

    let request = &transport.requests()[0];
    assert!(request.stream);
    assert!(request.functions.is_empty());
    assert_eq!(request.messages.len(), 2);
}

#[tokio::test]
async fn function_call_is_dispatched_and_the_turn_re_requested() {
    let transport = ScriptedTransport::new(vec![
        call_reply("getTime", None),
        text_reply(&["It is 12:00"]),
    ]);
    let (service, recording) = service_with(transport.clone(), ChatConfig::default());
    service
        .register_sync_fn(
            FunctionDescriptor::new("getTime")
                .with_description("Current wall clock time")
                .with_status_message("Checking the clock..."),
            |_args, _ctx| Ok("12:00".to_string()),
        )
        .expect("register getTime");

    let final_id = service.prompt("What time is it?").await.expect("turn succeeds");

    let history = service.history();
    assert_eq!(history.len(), 4);
    match &history[1] {
        Message::Assistant(message) => {
            let call = message.call().expect("assistant call");
            assert_eq!(call.name, "getTime");
            assert_eq!(call.arguments, "");
        }
        other => panic!("expected assistant call, got {other:?}"),
    }
    match &history[2] {
        Message::Function(result) => {
            assert_eq!(result.name, "getTime");
            assert_eq!(result.content, "12:00");
        }
        other => panic!("expected function result, got {other:?}"),
    }
    assert_eq!(assistant_text(&history[3]), Some("It is 12:00"));
    assert_eq!(history[3].id(), &final_id);
    assert_ne!(history[1].id(), history[3].id());

    let started = recording
        .events()
        .into_iter()
        .find_map(|event| match event {
            ChatEvent::FunctionCallStarted {
                message_id, status, ..
            } => Some((message_id, status)),
            _ => None,
        })
        .expect("call start event");
    assert_eq!(&started.0, history[1].id());
    assert_eq!(started.1.as_deref(), Some("Checking the clock..."));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].functions.len(), 1);
    let last = requests[1].messages.last().expect("function message");
    assert_eq!(last.role, "function");
    assert_eq!(last.name.as_deref(), Some("getTime"));
}

#[tokio::test]
async fn unknown_function_gets_a_synthetic_result_without_an_error() {
    let transport = ScriptedTransport::new(vec![
        call_reply("doThing", Some("{}")),
        text_reply(&["Sorry, I cannot do that."]),
    ]);
    let (service, recording) = service_with(transport.clone(), ChatConfig::default());

    assert!(service.send_user_prompt("Do the thing").await);

    let history = service.history();
    match &history[2] {
        Message::Function(result) => {
            assert_eq!(result.content, "Function 'doThing' does not exist.");
        }
        other => panic!("expected synthetic result, got {other:?}"),
    }
    assert_eq!(transport.requests().len(), 2);
    assert!(!recording.names().contains(&"turn_error"));
}

#[tokio::test]
async fn abort_mid_stream_reports_aborted_and_returns_to_idle() {
    let (transport, sender) = channel_transport();
    let (observer, mut events) = channel_observer();
    let service = Arc::new(
        ChatService::builder(transport)
            .observer(Arc::new(observer))
            .build()
            .expect("service should build"),
    );

    let running = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.prompt("Hello").await }
    });

    sender
        .send(Ok(CompletionChunk::content("Partial")))
        .expect("send chunk");
    next_matching(&mut events, |event| matches!(event, ChatEvent::ContentDelta { .. })).await;

    assert!(service.abort());
    assert!(!service.is_turn_in_progress());
    assert_eq!(service.request_phase(), RequestPhase::Idle);
    assert!(!service.abort());

    let _ = sender.send(Ok(CompletionChunk::content(" ignored")));
    let _ = sender.send(Ok(CompletionChunk::finish(FinishReason::Stop)));

    let error = running
        .await
        .expect("task should join")
        .expect_err("aborted turn");
    assert_eq!(error.kind, ChatErrorKind::Aborted);

    let terminal = next_matching(&mut events, |event| {
        matches!(event, ChatEvent::TurnError { .. } | ChatEvent::TurnFinished { .. })
    })
    .await;
    assert_eq!(
        terminal,
        ChatEvent::TurnError {
            kind: ChatErrorKind::Aborted,
            message: "turn aborted".to_string(),
            cause: None,
        }
    );
    assert_eq!(service.history().len(), 1);
}

fn counting_service(
    transport: Arc<ScriptedTransport>,
    max_chained_turns: usize,
) -> (ChatService, Arc<Recording>, Arc<AtomicUsize>) {
    let recording = Arc::new(Recording::default());
    let service = ChatService::builder(transport)
        .max_chained_turns(max_chained_turns)
        .observer(recording.clone())
        .build()
        .expect("service should build");

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    service
        .register_sync_fn(FunctionDescriptor::new("bump"), move |_args, _ctx| {
            Ok(counter.fetch_add(1, Ordering::SeqCst).to_string())
        })
        .expect("register bump");

    (service, recording, runs)
}

#[tokio::test]
async fn chained_calls_past_the_limit_fail_the_turn() {
    let transport = ScriptedTransport::new(vec![
        call_reply("bump", None),
        call_reply("bump", None),
        call_reply("bump", None),
        text_reply(&["never requested"]),
    ]);
    let (service, recording, runs) = counting_service(transport.clone(), 2);

    let error = service.prompt("Loop forever").await.expect_err("limit hit");

    assert_eq!(error.kind, ChatErrorKind::CallLimitExceeded);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(transport.requests().len(), 3);
    assert!(matches!(
        service.history().last(),
        Some(Message::Assistant(reply)) if matches!(&reply.body, AssistantBody::FunctionCall(call) if call.name == "bump")
    ));
    assert!(matches!(
        recording.events().last(),
        Some(ChatEvent::TurnError {
            kind: ChatErrorKind::CallLimitExceeded,
            ..
        })
    ));
    assert!(!service.is_turn_in_progress());
}

#[tokio::test]
async fn zero_call_limit_runs_no_function() {
    let transport = ScriptedTransport::new(vec![
        call_reply("bump", None),
        text_reply(&["never requested"]),
    ]);
    let (service, _, runs) = counting_service(transport.clone(), 0);

    let error = service.prompt("Bump once").await.expect_err("limit hit");

    assert_eq!(error.kind, ChatErrorKind::CallLimitExceeded);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(transport.requests().len(), 1);

    let history = service.history();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|message| !matches!(message, Message::Function(_))));
}

#[tokio::test]
async fn malformed_arguments_end_the_turn_without_retrying() {
    let transport = ScriptedTransport::new(vec![
        call_reply("lookup", Some("{\"query\": ")),
        text_reply(&["never requested"]),
    ]);
    let (service, _) = service_with(transport.clone(), ChatConfig::default());
    service
        .register_sync_fn(
            FunctionDescriptor::new("lookup")
                .with_parameter(ParameterDescriptor::string("query").required()),
            |args, _ctx| required_string(&args, "query"),
        )
        .expect("register lookup");

    let error = service.prompt("Find it").await.expect_err("bad arguments");

    assert_eq!(error.kind, ChatErrorKind::ArgumentParseFailure);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(service.history().len(), 2);
}

#[tokio::test]
async fn failing_function_surfaces_a_tooling_error() {
    let transport = ScriptedTransport::new(vec![call_reply("explode", Some("{}"))]);
    let (service, recording) = service_with(transport, ChatConfig::default());
    service
        .register_fn(FunctionDescriptor::new("explode"), |_args, _ctx| async {
            Err(ToolError::execution("boom"))
        })
        .expect("register explode");

    let error = service.prompt("Go").await.expect_err("tool fails");

    assert_eq!(error.kind, ChatErrorKind::Tooling);
    assert!(error.message.contains("boom"));
    assert_eq!(recording.names().last(), Some(&"turn_error"));
}

#[tokio::test]
async fn interrupted_stream_is_a_transport_failure() {
    let transport = ScriptedTransport::new(vec![vec![Ok(CompletionChunk::content("Hal"))]]);
    let (service, _) = service_with(transport, ChatConfig::default());

    let error = service.prompt("Hello").await.expect_err("interrupted");

    assert_eq!(error.kind, ChatErrorKind::TransportFailure);
    assert_eq!(service.history().len(), 1);
}

#[tokio::test]
async fn host_mutations_are_rejected_while_a_turn_runs() {
    let (transport, sender) = channel_transport();
    let (observer, mut events) = channel_observer();
    let service = Arc::new(
        ChatService::builder(transport)
            .observer(Arc::new(observer))
            .build()
            .expect("service should build"),
    );

    let running = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.prompt("Hello").await }
    });
    let echo = next_matching(&mut events, |event| {
        matches!(event, ChatEvent::UserPromptEcho { .. })
    })
    .await;
    let ChatEvent::UserPromptEcho { id, .. } = echo else {
        unreachable!("matched above");
    };

    assert!(service.is_turn_in_progress());
    assert!(!service.send_user_prompt("Another").await);

    let busy = [
        service.edit_user_prompt(&id, "changed").map(|_| ()),
        service.remove_message(&id).map(|_| ()),
        service.clear_history(),
        service.add_mixin("style", "Be brief."),
        service.remove_mixin("style").map(|_| ()),
        service
            .register_sync_fn(FunctionDescriptor::new("late"), |_args, _ctx| Ok(String::new())),
        service.remove_function("late").map(|_| ()),
        service.reconfigure(ChatConfig::new("gpt-4o")),
        service.set_transport(ScriptedTransport::new(Vec::new())),
    ];
    for result in busy {
        assert_eq!(
            result.expect_err("mutation must be rejected").kind,
            ChatErrorKind::AlreadyInProgress
        );
    }

    sender
        .send(Ok(CompletionChunk::content("Done")))
        .expect("send chunk");
    sender
        .send(Ok(CompletionChunk::finish(FinishReason::Stop)))
        .expect("send finish");
    running
        .await
        .expect("task should join")
        .expect("turn succeeds");

    let history = service.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id(), &id);
    assert!(service.add_mixin("style", "Be brief.").is_ok());
}

#[tokio::test]
async fn edit_truncates_and_resend_answers_the_new_prompt() {
    let transport = ScriptedTransport::new(vec![
        text_reply(&["First answer"]),
        text_reply(&["Second answer"]),
        text_reply(&["Edited answer"]),
    ]);
    let (service, recording) = service_with(transport.clone(), ChatConfig::default());

    service.prompt("First").await.expect("first turn");
    service.prompt("Second").await.expect("second turn");
    let first_id = service.history()[0].id().clone();

    service
        .edit_user_prompt(&first_id, "First, rephrased")
        .expect("edit");
    assert_eq!(service.history().len(), 1);
    assert!(matches!(
        recording.events().last(),
        Some(ChatEvent::UserRequest(message)) if message.content == "First, rephrased"
    ));

    service.resend().await.expect("resend");

    let history = service.history();
    assert_eq!(history.len(), 2);
    assert_eq!(assistant_text(&history[1]), Some("Edited answer"));

    let last_request = transport.requests().pop().expect("third request");
    assert_eq!(last_request.messages.len(), 2);
    assert_eq!(
        last_request.messages[1].content.as_deref(),
        Some("First, rephrased")
    );

    let error = service
        .edit_user_prompt(history[1].id(), "not a user turn")
        .expect_err("assistant id");
    assert_eq!(error.kind, ChatErrorKind::InvalidId);
}

#[tokio::test]
async fn requests_carry_at_most_the_window_plus_the_system_prompt() {
    let transport = ScriptedTransport::new(vec![
        text_reply(&["one"]),
        text_reply(&["two"]),
        text_reply(&["three"]),
    ]);
    let (service, _) = service_with(
        transport.clone(),
        ChatConfig::default().with_max_history(3),
    );

    for prompt in ["a", "b", "c"] {
        service.prompt(prompt).await.expect("turn succeeds");
    }

    let counts = transport
        .requests()
        .iter()
        .map(|request| request.messages.len())
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![2, 4, 4]);
    assert_eq!(service.history().len(), 6);
}

#[tokio::test]
async fn system_prompt_combines_mixins_in_order_with_the_model_role() {
    let transport = ScriptedTransport::new(Vec::new());
    let (service, _) = service_with(
        transport,
        ChatConfig::new("gpt-3.5-turbo").with_system_prompt("Base prompt."),
    );
    service.add_mixin("tone", "Be friendly.").expect("tone");
    service.add_mixin("lang", "Prefer Rust.").expect("lang");

    let duplicate = service
        .add_mixin("tone", "Be terse.")
        .expect_err("duplicate key");
    assert_eq!(duplicate.kind, ChatErrorKind::DuplicateKey);

    let request = service.build_request();
    assert_eq!(request.messages[0].role, "user");
    assert_eq!(
        request.messages[0].content.as_deref(),
        Some("Base prompt.\nBe friendly.\nPrefer Rust.")
    );

    assert!(service.remove_mixin("tone").expect("idle"));
    service
        .reconfigure(ChatConfig::new("gpt-4").with_system_prompt("New base."))
        .expect("reconfigure");
    let request = service.build_request();
    assert_eq!(request.model, "gpt-4");
    assert_eq!(request.messages[0].role, "system");
    assert_eq!(
        request.messages[0].content.as_deref(),
        Some("New base.\nPrefer Rust.")
    );
}

#[tokio::test]
async fn blank_prompts_are_refused_without_touching_history() {
    let transport = ScriptedTransport::new(Vec::new());
    let (service, recording) = service_with(transport.clone(), ChatConfig::default());

    assert!(!service.send_user_prompt("   ").await);
    let error = service.prompt("").await.expect_err("blank prompt");

    assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
    assert!(service.history().is_empty());
    assert!(recording.events().is_empty());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn annotations_and_code_are_folded_into_the_user_turn() {
    let transport = ScriptedTransport::new(vec![text_reply(&["It declares x."])]);
    let (service, _) = service_with(transport.clone(), ChatConfig::default());

    let prompt = UserPrompt::new("What does this do?")
        .with_annotation("Language is rust")
        .with_code("let x = 1;");
    service.prompt(prompt).await.expect("turn succeeds");

    let request = &transport.requests()[0];
    assert_eq!(
        request.messages[1].content.as_deref(),
        Some(
            "#SYSTEM: Language is rust\n#SYSTEM: User query below\n\nWhat does this do?\n\n```\nlet x = 1;\n```"
        )
    );
    assert!(matches!(
        &service.history()[0],
        Message::User(user) if user.code.as_deref() == Some("let x = 1;")
    ));
}

#[tokio::test]
async fn provider_errors_are_reported_as_turn_errors() {
    let transport = ScriptedTransport::new(vec![vec![Err(ProviderError::rate_limited(
        "slow down",
    ))]]);
    let (service, recording) = service_with(transport, ChatConfig::default());

    assert!(service.send_user_prompt("Hello").await);

    assert_eq!(
        recording.events().last(),
        Some(&ChatEvent::TurnError {
            kind: ChatErrorKind::Provider,
            message: "slow down".to_string(),
            cause: None,
        })
    );
    assert!(
        service
            .history()
            .iter()
            .all(|message| !matches!(message, Message::Assistant(reply) if matches!(reply.body, AssistantBody::Text(_))))
    );
}

#[tokio::test]
async fn transport_failure_cause_reaches_observers() {
    let transport = ScriptedTransport::new(vec![vec![
        Ok(CompletionChunk::content("Hal")),
        Err(ProviderError::transport("connection reset").with_cause("os error 104")),
    ]]);
    let (service, recording) = service_with(transport, ChatConfig::default());

    assert!(service.send_user_prompt("Hello").await);

    assert_eq!(
        recording.events().last(),
        Some(&ChatEvent::TurnError {
            kind: ChatErrorKind::TransportFailure,
            message: "connection reset".to_string(),
            cause: Some("os error 104".to_string()),
        })
    );
}
