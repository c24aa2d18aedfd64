use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use tutorbot_core::extract::{
    MAX_NUMBERED_ITEMS, expect_exactly, expect_some, lines, numbered_items, paragraphs, section,
};
use tutorbot_core::prompts::{
    Templates, chat_system_prompt, question_profile, starter_profile, study_profile,
};
use tutorbot_core::{
    Feature, GradeLevel, LLMProvider, LearningSpeed, PromptAdapter, PromptTemplate, ShapeError,
    ToneProfile, clean_output,
};
use tutorbot_history::{ConversationKey, HistoryStore};

use crate::conversation::{ConversationManager, chat_message};
use crate::document::PdfExtractor;
use crate::error::FeatureError;
use crate::output::{
    AdaptiveContent, ChatReply, ChatRequest, Examples, Explanation, Proofread, Questions, Starters,
    StudyPlan, Summary, TextSource,
};

const MAX_EXAMPLES: usize = 3;
const STARTER_COUNT: usize = 5;

const CORRECTED_START: &str = "Corrected text:";
const CORRECTED_END: &str = "===END_CORRECTED===";
const CHANGES_START: &str = "Changes made:";
const CHANGES_END: &str = "===END_CHANGES===";

/// Entry point for every learning feature.
///
/// Owns the parsed prompt templates and the model table. Each operation
/// makes exactly one model call.
pub struct Assistant {
    provider: Arc<dyn LLMProvider>,
    default_model: String,
    models: BTreeMap<Feature, String>,
    templates: Templates,
    leading_pages: PdfExtractor,
    all_pages: PdfExtractor,
    conversations: Option<ConversationManager>,
}

impl Assistant {
    pub fn new(provider: Arc<dyn LLMProvider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            models: BTreeMap::new(),
            templates: Templates::new(),
            leading_pages: PdfExtractor::default(),
            all_pages: PdfExtractor::all_pages(),
            conversations: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, feature: Feature, model: impl Into<String>) -> Self {
        self.models.insert(feature, model.into());
        self
    }

    /// Page bound for the tutor and proofreader. Other features read every page.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.leading_pages = PdfExtractor::new(max_pages);
        self
    }

    #[must_use]
    pub fn with_conversations(mut self, conversations: ConversationManager) -> Self {
        self.conversations = Some(conversations);
        self
    }

    #[must_use]
    pub fn model_for(&self, feature: Feature) -> &str {
        self.models
            .get(&feature)
            .map_or(self.default_model.as_str(), String::as_str)
    }

    #[must_use]
    pub fn history(&self) -> Option<&HistoryStore> {
        self.conversations.as_ref().map(ConversationManager::store)
    }

    async fn invoke(
        &self,
        feature: Feature,
        template: &PromptTemplate,
        vars: &HashMap<&str, &str>,
    ) -> Result<String, FeatureError> {
        let adapter = PromptAdapter::new(self.provider.as_ref(), self.model_for(feature));
        let raw = adapter
            .invoke(template, vars)
            .await
            .map_err(FeatureError::from_invoke)?;
        debug!("{} produced {} chars", feature, raw.len());
        Ok(raw)
    }

    async fn resolve_text(
        &self,
        source: TextSource,
        extractor: PdfExtractor,
        field: &'static str,
    ) -> Result<String, FeatureError> {
        let text = match source {
            TextSource::Text(text) => text,
            TextSource::PdfPath(path) => extractor.extract_path(&path).await?,
            TextSource::PdfBytes(bytes) => extractor.extract_bytes(bytes).await?,
        };
        if text.trim().is_empty() {
            return Err(FeatureError::MissingInput(field));
        }
        Ok(text)
    }

    pub async fn tutor(
        &self,
        grade: GradeLevel,
        source: TextSource,
        additional_context: &str,
    ) -> Result<Explanation, FeatureError> {
        let template = if source.is_document() {
            &self.templates.tutor_document
        } else {
            &self.templates.tutor_topic
        };
        let topic = self.resolve_text(source, self.leading_pages, "topic").await?;

        let vars = HashMap::from([
            ("grade_level", grade.as_str()),
            ("topic", topic.as_str()),
            ("add_cont", additional_context),
        ]);
        let raw = self.invoke(Feature::Tutor, template, &vars).await?;
        Ok(Explanation {
            output: clean_output(&raw),
        })
    }

    pub async fn rewrite(
        &self,
        speed: LearningSpeed,
        source: TextSource,
    ) -> Result<Explanation, FeatureError> {
        let text = self.resolve_text(source, self.all_pages, "text").await?;
        let learner_type = speed.learner_type();

        let vars = HashMap::from([
            ("learner_type", learner_type.as_str()),
            ("input_text", text.as_str()),
        ]);
        let raw = self
            .invoke(Feature::Rewriter, &self.templates.rewriter, &vars)
            .await?;
        Ok(Explanation {
            output: clean_output(&raw),
        })
    }

    pub async fn adapt(
        &self,
        grade: GradeLevel,
        speed: LearningSpeed,
        source: TextSource,
    ) -> Result<AdaptiveContent, FeatureError> {
        let context = self.resolve_text(source, self.all_pages, "text").await?;

        let vars = HashMap::from([
            ("grade_level", grade.as_str()),
            ("learning_speed", speed.as_str()),
            ("context", context.as_str()),
        ]);
        let raw = self
            .invoke(Feature::Leveler, &self.templates.leveler, &vars)
            .await?;
        Ok(AdaptiveContent {
            adaptive_content: raw.trim().to_string(),
        })
    }

    pub async fn proofread(
        &self,
        tone: ToneProfile,
        source: TextSource,
    ) -> Result<Proofread, FeatureError> {
        let template = if source.is_document() {
            &self.templates.proofreader_document
        } else {
            &self.templates.proofreader_text
        };
        let text = self.resolve_text(source, self.leading_pages, "text").await?;

        let vars = HashMap::from([("instructions", tone.instructions()), ("text", text.as_str())]);
        let raw = self.invoke(Feature::Proofreader, template, &vars).await?;
        Ok(split_proofread(&raw))
    }

    pub async fn five_questions(
        &self,
        grade: GradeLevel,
        topic: &str,
    ) -> Result<Questions, FeatureError> {
        let topic = require(topic, "topic")?;
        let vars = HashMap::from([
            ("topic", topic),
            ("grade_level", grade.as_str()),
            ("profile", question_profile(grade)),
        ]);
        let raw = self
            .invoke(Feature::FiveQuestion, &self.templates.five_questions, &vars)
            .await?;

        let questions = expect_exactly(numbered_items(&raw), MAX_NUMBERED_ITEMS, "questions")?;
        Ok(Questions { questions })
    }

    pub async fn real_world(&self, grade: GradeLevel, topic: &str) -> Result<Examples, FeatureError> {
        let topic = require(topic, "topic")?;
        let vars = HashMap::from([("topic", topic), ("grade_level", grade.as_str())]);
        let raw = self
            .invoke(Feature::RealWorld, &self.templates.real_world, &vars)
            .await?;

        let examples = paragraphs(&raw, MAX_EXAMPLES)
            .iter()
            .map(|p| clean_output(p))
            .filter(|p| !p.is_empty())
            .collect();
        Ok(Examples {
            examples: expect_some(examples, "examples")?,
        })
    }

    pub async fn sentence_starters(
        &self,
        grade: GradeLevel,
        topic: &str,
    ) -> Result<Starters, FeatureError> {
        let topic = require(topic, "topic")?;
        let vars = HashMap::from([
            ("grade_level", grade.as_str()),
            ("profile", starter_profile(grade)),
            ("topic", topic),
        ]);
        let raw = self
            .invoke(
                Feature::SentenceStarters,
                &self.templates.sentence_starters,
                &vars,
            )
            .await?;

        let starters = expect_exactly(
            lines(&clean_output(&raw), STARTER_COUNT),
            STARTER_COUNT,
            "sentence starters",
        )?;
        Ok(Starters { starters })
    }

    pub async fn study_plan(&self, grade: GradeLevel, goal: &str) -> Result<StudyPlan, FeatureError> {
        let goal = require(goal, "goal")?;
        let vars = HashMap::from([
            ("grade_level", grade.as_str()),
            ("goal", goal),
            ("profile", study_profile(grade)),
        ]);
        let raw = self
            .invoke(Feature::StudyHabits, &self.templates.study_plan, &vars)
            .await?;

        let plan = raw.trim();
        if plan.is_empty() {
            return Err(ShapeError::Empty { what: "study plan" }.into());
        }
        Ok(StudyPlan {
            plan: plan.to_string(),
        })
    }

    pub async fn summarize(
        &self,
        source: TextSource,
        conditions: &str,
    ) -> Result<Summary, FeatureError> {
        let conditions = require(conditions, "conditions")?;
        let text = self.resolve_text(source, self.all_pages, "text").await?;

        let vars = HashMap::from([("text", text.as_str()), ("conditions", conditions)]);
        let raw = self
            .invoke(Feature::Summarizer, &self.templates.summarizer, &vars)
            .await?;
        Ok(Summary {
            summary: raw.trim().to_string(),
        })
    }

    /// One multi-turn exchange: replay history, call the model, record both turns.
    pub async fn chat(
        &self,
        feature: Feature,
        request: &ChatRequest,
    ) -> Result<ChatReply, FeatureError> {
        if !feature.supports_chat() {
            return Err(FeatureError::ChatUnsupported(feature));
        }
        let conversations = self
            .conversations
            .as_ref()
            .ok_or(FeatureError::HistoryDisabled)?;
        let message = require(&request.message, "message")?;

        let key = ConversationKey::new(
            feature.agent_name(),
            request.user_id.as_str(),
            request.thread_id.as_str(),
        );
        let human = chat_message(request.grade, &request.topic, message);
        // Held until both turns are written so concurrent turns on this key queue up.
        let _exchange = conversations.lock(&key).await;
        let messages = conversations
            .build_messages(&key, chat_system_prompt(feature), &human)
            .await;

        info!(
            "Chat turn for {} with {} messages",
            key,
            messages.len()
        );
        let response = self
            .provider
            .chat(&messages, self.model_for(feature))
            .await
            .map_err(FeatureError::Model)?
            .content;

        conversations.record(&key, message, &response).await?;

        let questions = if feature == Feature::FiveQuestion {
            let items = numbered_items(&response);
            (items.len() == MAX_NUMBERED_ITEMS).then_some(items)
        } else {
            None
        };
        Ok(ChatReply {
            response,
            questions,
        })
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FeatureError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FeatureError::MissingInput(field));
    }
    Ok(trimmed)
}

fn split_proofread(raw: &str) -> Proofread {
    match section(raw, CORRECTED_START, CORRECTED_END) {
        Some(corrected) => Proofread {
            corrected: clean_output(corrected),
            changes: section(raw, CHANGES_START, CHANGES_END)
                .map(clean_output)
                .unwrap_or_default(),
        },
        None => Proofread {
            corrected: clean_output(raw),
            changes: String::new(),
        },
    }
}
