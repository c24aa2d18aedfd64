//! End-to-end feature tests against a scripted model and in-memory history.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tutorbot_core::{
    ChatMessage, Feature, GradeLevel, LLMProvider, LLMResponse, LearningSpeed, Role, ShapeError,
    ToneProfile,
};
use tutorbot_features::{
    Assistant, ChatRequest, ConversationManager, DocumentError, FeatureError, TextSource,
};
use tutorbot_history::{ConversationKey, HistoryStore, Speaker};

#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    seen: Mutex<Vec<(Vec<ChatMessage>, String)>>,
}

impl ScriptedProvider {
    fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            seen: Mutex::default(),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            seen: Mutex::default(),
        })
    }

    fn calls(&self) -> Vec<(Vec<ChatMessage>, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<LLMResponse> {
        self.seen
            .lock()
            .unwrap()
            .push((messages.to_vec(), model.to_string()));
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()));
        match next {
            Ok(content) => Ok(LLMResponse {
                content,
                usage: None,
            }),
            Err(e) => Err(anyhow::anyhow!(e)),
        }
    }

    fn get_default_model(&self) -> &'static str {
        "scripted"
    }
}

fn assistant(provider: &Arc<ScriptedProvider>) -> Assistant {
    Assistant::new(provider.clone(), "gemma3")
}

async fn with_history(provider: &Arc<ScriptedProvider>) -> (Assistant, HistoryStore) {
    let store = HistoryStore::connect("sqlite::memory:").await.unwrap();
    store.ensure_schema().await.unwrap();
    for feature in Feature::ALL {
        store.register_agent(feature.agent_name()).await.unwrap();
    }
    let assistant =
        assistant(provider).with_conversations(ConversationManager::new(store.clone(), 20));
    (assistant, store)
}

fn chat_request(message: &str) -> ChatRequest {
    ChatRequest {
        user_id: "7".to_string(),
        thread_id: "42".to_string(),
        grade: GradeLevel::Elementary,
        topic: "volcanoes".to_string(),
        message: message.to_string(),
    }
}

#[tokio::test]
async fn tutor_fills_template_and_cleans_output() {
    let provider = ScriptedProvider::replying(&["**Volcanoes** are *mountains*.\n- They erupt."]);
    let out = assistant(&provider)
        .tutor(
            GradeLevel::Elementary,
            TextSource::Text("volcanoes".to_string()),
            "likes pictures",
        )
        .await
        .unwrap();
    assert_eq!(out.output, "Volcanoes are mountains.\nThey erupt.");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let (messages, model) = &calls[0];
    assert_eq!(model, "gemma3");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].content.contains("Grade Level: elementary"));
    assert!(messages[0].content.contains("Topic: volcanoes"));
    assert!(messages[0].content.contains("likes pictures"));
}

#[tokio::test]
async fn five_questions_returns_exactly_five() {
    let provider = ScriptedProvider::replying(&[
        "1. Why do leaves change color?\n2. How do trees drink?\n3. What if there were no forests?\n4. Why are some trees tall?\n5. How do seeds travel?\n6. Extra?",
    ]);
    let out = assistant(&provider)
        .five_questions(GradeLevel::Elementary, "trees")
        .await
        .unwrap();
    assert_eq!(out.questions.len(), 5);
    assert_eq!(out.questions[0], "Why do leaves change color?");
    assert_eq!(out.questions[4], "How do seeds travel?");
}

#[tokio::test]
async fn five_questions_short_list_is_a_shape_error() {
    let provider = ScriptedProvider::replying(&["1. One?\n2. Two?\n3. Three?"]);
    let err = assistant(&provider)
        .five_questions(GradeLevel::College, "ethics")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeatureError::Shape(ShapeError::ShortList {
            expected: 5,
            got: 3,
            ..
        })
    ));
}

#[tokio::test]
async fn real_world_examples_are_paragraphs() {
    let provider = ScriptedProvider::replying(&[
        "**Solar Panels**\nThey turn light into power.\n\n**Plants**\nThey make food from light.\n\n**Cameras**\nThey capture light.\n\n**Extra**\nDropped.",
    ]);
    let out = assistant(&provider)
        .real_world(GradeLevel::JuniorHigh, "light")
        .await
        .unwrap();
    assert_eq!(out.examples.len(), 3);
    assert_eq!(out.examples[0], "Solar Panels\nThey turn light into power.");
}

#[tokio::test]
async fn empty_real_world_reply_is_reported() {
    let provider = ScriptedProvider::replying(&["   \n\n  "]);
    let err = assistant(&provider)
        .real_world(GradeLevel::JuniorHigh, "light")
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::Shape(ShapeError::Empty { .. })));
}

#[tokio::test]
async fn sentence_starters_strip_markers() {
    let provider = ScriptedProvider::replying(&[
        "- In my opinion,\n- One reason is\n* For example,\n- Another idea is\n- Finally,",
    ]);
    let out = assistant(&provider)
        .sentence_starters(GradeLevel::SeniorHigh, "recycling")
        .await
        .unwrap();
    assert_eq!(
        out.starters,
        vec![
            "In my opinion,",
            "One reason is",
            "For example,",
            "Another idea is",
            "Finally,"
        ]
    );
}

#[tokio::test]
async fn proofreader_splits_corrected_and_changes() {
    let provider = ScriptedProvider::replying(&[
        "Corrected text:\nI have two apples.\n===END_CORRECTED===\nChanges made:\n- apples spelling\n===END_CHANGES===",
    ]);
    let out = assistant(&provider)
        .proofread(
            ToneProfile::Academic,
            TextSource::Text("i has two aples".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(out.corrected, "I have two apples.");
    assert_eq!(out.changes, "apples spelling");

    let calls = provider.calls();
    assert!(calls[0].0[0].content.starts_with("Use a formal academic tone."));
}

#[tokio::test]
async fn rewriter_and_leveler_pass_learner_profile() {
    let provider = ScriptedProvider::replying(&["simple words", "  explained  "]);
    let assistant = assistant(&provider);

    let rewritten = assistant
        .rewrite(LearningSpeed::Slow, TextSource::Text("mitochondria".to_string()))
        .await
        .unwrap();
    assert_eq!(rewritten.output, "simple words");

    let adapted = assistant
        .adapt(
            GradeLevel::Kindergarten,
            LearningSpeed::Fast,
            TextSource::Text("mitochondria".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(adapted.adaptive_content, "explained");

    let calls = provider.calls();
    assert!(calls[0].0[0].content.contains("Learner Type: slow learner"));
    assert!(calls[1].0[0].content.contains("Learning speed: fast"));
}

#[tokio::test]
async fn study_plan_and_summary_are_trimmed() {
    let provider = ScriptedProvider::replying(&["\nWeek 1: Basics\n", " A short summary. "]);
    let assistant = assistant(&provider);

    let plan = assistant
        .study_plan(GradeLevel::College, "exam in 3 days")
        .await
        .unwrap();
    assert_eq!(plan.plan, "Week 1: Basics");

    let summary = assistant
        .summarize(TextSource::Text("long text".to_string()), "1 paragraph")
        .await
        .unwrap();
    assert_eq!(summary.summary, "A short summary.");
    assert!(provider.calls()[1].0[0].content.contains("1 paragraph"));
}

#[tokio::test]
async fn per_feature_model_override() {
    let provider = ScriptedProvider::replying(&["plan"]);
    assistant(&provider)
        .with_model(Feature::StudyHabits, "llama3")
        .study_plan(GradeLevel::College, "finals")
        .await
        .unwrap();
    assert_eq!(provider.calls()[0].1, "llama3");
}

#[tokio::test]
async fn blank_input_never_reaches_the_model() {
    let provider = ScriptedProvider::replying(&["unused"]);
    let err = assistant(&provider)
        .five_questions(GradeLevel::Elementary, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::MissingInput("topic")));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn missing_document_is_reported_before_any_model_call() {
    let provider = ScriptedProvider::replying(&["unused"]);
    let path = std::env::temp_dir().join("tutorbot-no-such-upload.pdf");
    let err = assistant(&provider)
        .tutor(GradeLevel::Elementary, TextSource::PdfPath(path), "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeatureError::Document(DocumentError::NotFound(_))
    ));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn model_failure_is_distinguished() {
    let provider = ScriptedProvider::failing("connection refused");
    let err = assistant(&provider)
        .study_plan(GradeLevel::College, "finals")
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::Model(_)));
}

#[tokio::test]
async fn two_chat_calls_leave_four_turns_in_order() {
    let provider = ScriptedProvider::replying(&["first answer", "second answer"]);
    let (assistant, store) = with_history(&provider).await;

    assistant
        .chat(Feature::Tutor, &chat_request("what is lava?"))
        .await
        .unwrap();
    assistant
        .chat(Feature::Tutor, &chat_request("is it hot?"))
        .await
        .unwrap();

    let key = ConversationKey::new("tutor", "7", "42");
    let turns = store.read(&key).await.unwrap();
    let seen: Vec<_> = turns
        .iter()
        .map(|t| (t.speaker, t.content.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (Speaker::Human, "what is lava?"),
            (Speaker::Assistant, "first answer"),
            (Speaker::Human, "is it hot?"),
            (Speaker::Assistant, "second answer"),
        ]
    );

    let calls = provider.calls();
    let second = &calls[1].0;
    assert_eq!(second[0].role, Role::System);
    assert_eq!(second[1].content, "what is lava?");
    assert_eq!(second[2].content, "first answer");
    assert_eq!(
        second[3].content,
        "Grade Level: elementary\nTopic: volcanoes\nCurrent message: is it hot?"
    );
}

/// Records how many messages each call saw, then answers after a pause.
#[derive(Default)]
struct SlowProvider {
    message_counts: Mutex<Vec<usize>>,
}

#[async_trait]
impl LLMProvider for SlowProvider {
    async fn chat(&self, messages: &[ChatMessage], _model: &str) -> anyhow::Result<LLMResponse> {
        let n = {
            let mut counts = self.message_counts.lock().unwrap();
            counts.push(messages.len());
            counts.len()
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(LLMResponse {
            content: format!("answer {n}"),
            usage: None,
        })
    }

    fn get_default_model(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn concurrent_chats_on_one_thread_see_each_other() {
    let provider = Arc::new(SlowProvider::default());
    let store = HistoryStore::connect("sqlite::memory:").await.unwrap();
    store.ensure_schema().await.unwrap();
    store.register_agent("tutor").await.unwrap();
    let assistant = Assistant::new(provider.clone(), "gemma3")
        .with_conversations(ConversationManager::new(store.clone(), 20));

    let first = chat_request("what is lava?");
    let second = chat_request("is it hot?");
    let (a, b) = tokio::join!(
        assistant.chat(Feature::Tutor, &first),
        assistant.chat(Feature::Tutor, &second),
    );
    a.unwrap();
    b.unwrap();

    let mut counts = provider.message_counts.lock().unwrap().clone();
    counts.sort_unstable();
    assert_eq!(counts, vec![2, 4]);

    let turns = store
        .read(&ConversationKey::new("tutor", "7", "42"))
        .await
        .unwrap();
    let speakers: Vec<_> = turns.iter().map(|t| t.speaker).collect();
    assert_eq!(
        speakers,
        vec![
            Speaker::Human,
            Speaker::Assistant,
            Speaker::Human,
            Speaker::Assistant
        ]
    );
}

#[tokio::test]
async fn five_question_chat_exposes_questions_only_for_five() {
    let provider = ScriptedProvider::replying(&[
        "1. A?\n2. B?\n3. C?\n4. D?\n5. E?",
        "Sure, here is one more:\n1. F?",
    ]);
    let (assistant, _store) = with_history(&provider).await;

    let full = assistant
        .chat(Feature::FiveQuestion, &chat_request("more please"))
        .await
        .unwrap();
    assert_eq!(full.questions.as_ref().map(Vec::len), Some(5));

    let partial = assistant
        .chat(Feature::FiveQuestion, &chat_request("one more"))
        .await
        .unwrap();
    assert!(partial.questions.is_none());
    assert!(partial.response.contains("F?"));
}

#[tokio::test]
async fn chat_is_rejected_for_single_shot_features() {
    let provider = ScriptedProvider::replying(&["unused"]);
    let (assistant, _store) = with_history(&provider).await;
    let err = assistant
        .chat(Feature::Rewriter, &chat_request("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::ChatUnsupported(Feature::Rewriter)));
}

#[tokio::test]
async fn chat_without_history_is_rejected() {
    let provider = ScriptedProvider::replying(&["unused"]);
    let err = assistant(&provider)
        .chat(Feature::Tutor, &chat_request("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, FeatureError::HistoryDisabled));
}
