use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::future::Future;
use tracing::info;
use tutorbot_core::{Feature, GradeLevel, LearningSpeed, ToneProfile};
use tutorbot_features::FeatureError;
use tutorbot_history::{ConversationKey, HistoryStore, Turn};

use crate::AppState;
use crate::error::ApiError;
use crate::form::{Form, Mode, PromptBody, PromptRequest};

async fn bounded<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, FeatureError>>,
{
    match state.request_timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| ApiError::Timeout(limit.as_secs()))?
            .map_err(ApiError::from),
        None => work.await.map_err(ApiError::from),
    }
}

fn reply<T: Serialize>(value: T) -> Response {
    Json(value).into_response()
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn prompt_feature(
    state: &AppState,
    feature: Feature,
    body: PromptRequest,
) -> Result<Response, ApiError> {
    info!("{} request in {:?} mode", feature, body.mode);
    if body.mode == Mode::Chat {
        let request = body.chat_request()?;
        let out = bounded(state, state.assistant.chat(feature, &request)).await?;
        return Ok(reply(out));
    }

    let grade = body.grade()?;
    let assistant = &state.assistant;
    let topic = body.topic.as_str();
    Ok(match feature {
        Feature::FiveQuestion => reply(bounded(state, assistant.five_questions(grade, topic)).await?),
        Feature::RealWorld => reply(bounded(state, assistant.real_world(grade, topic)).await?),
        Feature::SentenceStarters => {
            reply(bounded(state, assistant.sentence_starters(grade, topic)).await?)
        }
        Feature::StudyHabits => reply(bounded(state, assistant.study_plan(grade, topic)).await?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "{other} is not served by this endpoint"
            )));
        }
    })
}

/// POST /fivequestions
pub async fn five_questions(
    State(state): State<AppState>,
    PromptBody(body): PromptBody,
) -> Result<Response, ApiError> {
    prompt_feature(&state, Feature::FiveQuestion, body).await
}

/// POST /realworld
pub async fn real_world(
    State(state): State<AppState>,
    PromptBody(body): PromptBody,
) -> Result<Response, ApiError> {
    prompt_feature(&state, Feature::RealWorld, body).await
}

/// POST /sentencestarters
pub async fn sentence_starters(
    State(state): State<AppState>,
    PromptBody(body): PromptBody,
) -> Result<Response, ApiError> {
    prompt_feature(&state, Feature::SentenceStarters, body).await
}

/// POST /studyhabits
pub async fn study_habits(
    State(state): State<AppState>,
    PromptBody(body): PromptBody,
) -> Result<Response, ApiError> {
    prompt_feature(&state, Feature::StudyHabits, body).await
}

/// POST /tutor
pub async fn tutor(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = Form::read(multipart?).await?;
    if form.mode()? == Mode::Chat {
        let request = form.chat_request(&["topic"])?;
        let out = bounded(&state, state.assistant.chat(Feature::Tutor, &request)).await?;
        return Ok(reply(out));
    }

    let grade: GradeLevel = form.required(&["grade_level"])?.parse()?;
    let additional = form
        .text(&["add_cont", "additional_context"])
        .unwrap_or_default()
        .to_string();
    let source = form.source(&["topic"]);
    let out = bounded(&state, state.assistant.tutor(grade, source, &additional)).await?;
    Ok(reply(out))
}

/// POST /rewriter
pub async fn rewriter(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = Form::read(multipart?).await?;
    let speed: LearningSpeed = form
        .required(&["learning_speed", "learner_type"])?
        .parse()?;
    let source = form.source(&["input_text", "text"]);
    let out = bounded(&state, state.assistant.rewrite(speed, source)).await?;
    Ok(reply(out))
}

/// POST /adaptive-content
pub async fn adaptive_content(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = Form::read(multipart?).await?;
    let grade: GradeLevel = form.required(&["grade_level"])?.parse()?;
    let speed: LearningSpeed = form.required(&["learning_speed"])?.parse()?;
    let source = form.source(&["input_text", "text"]);
    let out = bounded(&state, state.assistant.adapt(grade, speed, source)).await?;
    Ok(reply(out))
}

/// POST /proofreader
pub async fn proofreader(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = Form::read(multipart?).await?;
    if form.mode()? == Mode::Chat {
        let request = form.chat_request(&["text", "input_text"])?;
        let out = bounded(
            &state,
            state.assistant.chat(Feature::Proofreader, &request),
        )
        .await?;
        return Ok(reply(out));
    }

    let tone: ToneProfile = form.required(&["profile", "tone"])?.parse()?;
    let source = form.source(&["text", "input_text"]);
    let out = bounded(&state, state.assistant.proofread(tone, source)).await?;
    Ok(reply(out))
}

/// POST /summarize
pub async fn summarize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = Form::read(multipart?).await?;
    let conditions = form.required(&["conditions"])?.to_string();
    let source = form.source(&["input_text", "text"]);
    let out = bounded(&state, state.assistant.summarize(source, &conditions)).await?;
    Ok(reply(out))
}

fn history_key(
    state: &AppState,
    (agent, user_id, thread_id): (String, String, String),
) -> Result<(&HistoryStore, ConversationKey), ApiError> {
    let feature: Feature = agent.parse()?;
    let store = state
        .assistant
        .history()
        .ok_or(FeatureError::HistoryDisabled)?;
    Ok((
        store,
        ConversationKey::new(feature.agent_name(), user_id, thread_id),
    ))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub agent: String,
    pub user_id: String,
    pub thread_id: String,
    pub turns: Vec<Turn>,
}

/// GET /history/{agent}/{user_id}/{thread_id}
pub async fn read_history(
    State(state): State<AppState>,
    Path(params): Path<(String, String, String)>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let (store, key) = history_key(&state, params)?;
    let turns = store.read(&key).await?;
    Ok(Json(HistoryResponse {
        agent: key.agent,
        user_id: key.user_id,
        thread_id: key.thread_id,
        turns,
    }))
}

/// DELETE /history/{agent}/{user_id}/{thread_id}
pub async fn clear_history(
    State(state): State<AppState>,
    Path(params): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let (store, key) = history_key(&state, params)?;
    let cleared = store.clear(&key).await?;
    Ok(Json(json!({ "cleared": cleared })))
}
