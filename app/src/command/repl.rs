//! Terminal read-eval loops for the text-transforming features.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tutorbot_core::{GradeLevel, LearningSpeed};
use tutorbot_features::{Assistant, TextSource};

use super::{Prompter, init_common_components, is_exit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReplFeature {
    Leveler,
    Rewriter,
    Summarizer,
}

/// Strategy for the interactive loops.
#[derive(Debug, Clone, Copy)]
pub struct ReplStrategy;

impl super::CommandStrategy for ReplStrategy {
    type Input = ReplFeature;

    async fn execute(&self, feature: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;
        let mut repl = Repl {
            assistant: &common.assistant,
            prompter: Prompter::new(),
        };

        println!("=== {feature:?} ===");
        println!("Paste text, or type 'pdf' to load a document. 'exit' quits.\n");
        while let Some(source) = repl.source().await? {
            let keep_going = match feature {
                ReplFeature::Leveler => repl.level(source).await?,
                ReplFeature::Rewriter => repl.rewrite(source).await?,
                ReplFeature::Summarizer => repl.summarize(source).await?,
            };
            if !keep_going {
                break;
            }
        }
        println!("Exiting. Thank you!");
        Ok(())
    }
}

/// What to do after a summary has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    Add,
    Replace,
    Keep,
    Exit,
}

impl FromStr for NextStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "keep" => Ok(Self::Keep),
            "exit" | "quit" | "q" => Ok(Self::Exit),
            other => Err(format!(
                "Invalid option '{other}'. Please type 'add', 'replace', 'keep', or 'exit'."
            )),
        }
    }
}

fn add_conditions(current: &str, extra: &str) -> String {
    format!("{current}; {extra}")
}

struct Repl<'a> {
    assistant: &'a Assistant,
    prompter: Prompter,
}

impl Repl<'_> {
    /// Reads a line, mapping end of input and exit words to `None`.
    async fn line(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .prompter
            .ask(label)
            .await?
            .filter(|line| !is_exit(line)))
    }

    /// Asks until the answer parses.
    async fn parsed<T>(&mut self, label: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        while let Some(line) = self.line(label).await? {
            match line.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => eprintln!("{e}"),
            }
        }
        Ok(None)
    }

    async fn source(&mut self) -> anyhow::Result<Option<TextSource>> {
        loop {
            let Some(line) = self.line("Text (or 'pdf'): ").await? else {
                return Ok(None);
            };
            if line.eq_ignore_ascii_case("pdf") {
                let Some(path) = self.line("Path to PDF file: ").await? else {
                    return Ok(None);
                };
                return Ok(Some(TextSource::PdfPath(PathBuf::from(
                    path.trim_matches('"'),
                ))));
            }
            if !line.is_empty() {
                return Ok(Some(TextSource::Text(line)));
            }
        }
    }

    async fn level(&mut self, source: TextSource) -> anyhow::Result<bool> {
        let Some(grade) = self.parsed::<GradeLevel>("Grade level: ").await? else {
            return Ok(false);
        };
        let Some(speed) = self.parsed::<LearningSpeed>("Learning speed: ").await? else {
            return Ok(false);
        };
        match self.assistant.adapt(grade, speed, source).await {
            Ok(out) => println!("\n{}\n", out.adaptive_content),
            Err(e) => eprintln!("Error: {e}"),
        }
        Ok(true)
    }

    async fn rewrite(&mut self, source: TextSource) -> anyhow::Result<bool> {
        let Some(speed) = self
            .parsed::<LearningSpeed>("Learner type (slow, average, fast): ")
            .await?
        else {
            return Ok(false);
        };
        match self.assistant.rewrite(speed, source).await {
            Ok(out) => println!("\n{}\n", out.output),
            Err(e) => eprintln!("Error: {e}"),
        }
        Ok(true)
    }

    async fn summarize(&mut self, source: TextSource) -> anyhow::Result<bool> {
        let Some(mut conditions) = self
            .line("Summary conditions (e.g. 1 paragraph, 5 bullet points): ")
            .await?
        else {
            return Ok(false);
        };

        loop {
            match self.assistant.summarize(source.clone(), &conditions).await {
                Ok(out) => println!("\nSummary:\n\n{}\n", out.summary),
                Err(e) => eprintln!("Error: {e}"),
            }

            let next = self
                .parsed::<NextStep>("Summarize again? (add / replace / keep / exit): ")
                .await?;
            match next {
                Some(NextStep::Add) => {
                    let Some(extra) = self.line("Condition(s) to add: ").await? else {
                        return Ok(false);
                    };
                    conditions = add_conditions(&conditions, &extra);
                }
                Some(NextStep::Replace) => {
                    let Some(new) = self.line("New condition(s): ").await? else {
                        return Ok(false);
                    };
                    conditions = new;
                }
                Some(NextStep::Keep) => println!("Reusing existing conditions."),
                Some(NextStep::Exit) | None => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_appends_with_semicolon() {
        assert_eq!(
            add_conditions("1 paragraph", "mention the dates"),
            "1 paragraph; mention the dates"
        );
    }

    #[test]
    fn next_step_parses_case_insensitively() {
        assert_eq!("ADD".parse::<NextStep>(), Ok(NextStep::Add));
        assert_eq!(" keep ".parse::<NextStep>(), Ok(NextStep::Keep));
        assert_eq!("replace".parse::<NextStep>(), Ok(NextStep::Replace));
        assert!("again".parse::<NextStep>().unwrap_err().contains("'again'"));
    }
}
