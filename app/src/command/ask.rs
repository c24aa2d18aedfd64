//! Single-shot feature invocation from the command line.

use serde_json::Value;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use tutorbot_core::{Feature, GradeLevel, LearningSpeed, ToneProfile};
use tutorbot_features::Assistant;

use super::{init_common_components, text_source};

/// Input parameters for the Ask command strategy.
#[derive(Debug, Clone)]
pub struct AskInput {
    pub feature: Feature,
    pub grade: Option<GradeLevel>,
    /// Topic, goal or prompt for the question-style features.
    pub topic: Option<String>,
    /// Text to rewrite, level, proofread or summarize.
    pub text: Option<String>,
    /// Document read instead of `text`.
    pub pdf: Option<PathBuf>,
    pub speed: Option<LearningSpeed>,
    pub tone: Option<ToneProfile>,
    pub conditions: Option<String>,
    /// Extra tutor context such as learning preferences.
    pub context: Option<String>,
    /// Print the raw JSON shape served over HTTP.
    pub json: bool,
}

/// Runs one feature once and prints the result.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;
        info!(
            "Asking {} with model {}",
            input.feature,
            common.assistant.model_for(input.feature)
        );

        let json = input.json;
        let value = run(&common.assistant, input).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            print!("{}", plain_text(&value));
        }
        Ok(())
    }
}

fn required<T>(value: Option<T>, flag: &str, feature: Feature) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("--{flag} is required for {feature}"))
}

async fn run(assistant: &Assistant, input: AskInput) -> anyhow::Result<Value> {
    let feature = input.feature;
    let topic = input.topic.unwrap_or_default();

    let value = match feature {
        Feature::Tutor => {
            let grade = required(input.grade, "grade", feature)?;
            let source = text_source(Some(topic), input.pdf);
            let context = input.context.unwrap_or_default();
            serde_json::to_value(assistant.tutor(grade, source, &context).await?)?
        }
        Feature::Rewriter => {
            let speed = required(input.speed, "speed", feature)?;
            let source = text_source(input.text, input.pdf);
            serde_json::to_value(assistant.rewrite(speed, source).await?)?
        }
        Feature::Leveler => {
            let grade = required(input.grade, "grade", feature)?;
            let speed = required(input.speed, "speed", feature)?;
            let source = text_source(input.text, input.pdf);
            serde_json::to_value(assistant.adapt(grade, speed, source).await?)?
        }
        Feature::Proofreader => {
            let tone = required(input.tone, "tone", feature)?;
            let source = text_source(input.text, input.pdf);
            serde_json::to_value(assistant.proofread(tone, source).await?)?
        }
        Feature::Summarizer => {
            let conditions = required(input.conditions, "conditions", feature)?;
            let source = text_source(input.text, input.pdf);
            serde_json::to_value(assistant.summarize(source, &conditions).await?)?
        }
        Feature::FiveQuestion => {
            let grade = required(input.grade, "grade", feature)?;
            serde_json::to_value(assistant.five_questions(grade, &topic).await?)?
        }
        Feature::RealWorld => {
            let grade = required(input.grade, "grade", feature)?;
            serde_json::to_value(assistant.real_world(grade, &topic).await?)?
        }
        Feature::SentenceStarters => {
            let grade = required(input.grade, "grade", feature)?;
            serde_json::to_value(assistant.sentence_starters(grade, &topic).await?)?
        }
        Feature::StudyHabits => {
            let grade = required(input.grade, "grade", feature)?;
            serde_json::to_value(assistant.study_plan(grade, &topic).await?)?
        }
    };
    Ok(value)
}

/// Terminal rendering of a feature result: text fields as blocks, lists numbered.
fn plain_text(value: &Value) -> String {
    let mut out = String::new();
    let Value::Object(fields) = value else {
        let _ = writeln!(out, "{value}");
        return out;
    };

    let labelled = fields.len() > 1;
    for (name, field) in fields {
        match field {
            Value::String(text) if text.is_empty() => {}
            Value::String(text) => {
                if labelled {
                    let _ = writeln!(out, "{}:", label(name));
                }
                let _ = writeln!(out, "{text}\n");
            }
            Value::Array(items) => {
                if labelled {
                    let _ = writeln!(out, "{}:", label(name));
                }
                for (i, item) in items.iter().enumerate() {
                    let item = item.as_str().map_or_else(|| item.to_string(), str::to_string);
                    let _ = writeln!(out, "{}. {item}", i + 1);
                }
                out.push('\n');
            }
            Value::Null => {}
            other => {
                let _ = writeln!(out, "{}: {other}", label(name));
            }
        }
    }
    out
}

fn label(name: &str) -> String {
    let mut chars = name.replace('_', " ").chars().collect::<Vec<_>>();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_text_field_prints_bare() {
        assert_eq!(plain_text(&json!({"output": "Gravity pulls."})), "Gravity pulls.\n\n");
    }

    #[test]
    fn lists_are_numbered() {
        assert_eq!(
            plain_text(&json!({"questions": ["Why?", "How?"]})),
            "1. Why?\n2. How?\n\n"
        );
    }

    #[test]
    fn several_fields_are_labelled_and_blanks_skipped() {
        let text = plain_text(&json!({"corrected": "I have a cat.", "changes": ""}));
        assert_eq!(text, "Corrected:\nI have a cat.\n\n");

        let text = plain_text(&json!({"corrected": "Fine.", "changes": "has -> have"}));
        assert!(text.contains("Changes:\nhas -> have"));
    }

    #[test]
    fn missing_flag_names_the_feature() {
        let err = required::<GradeLevel>(None, "grade", Feature::FiveQuestion).unwrap_err();
        assert_eq!(err.to_string(), "--grade is required for five-question");
    }
}
