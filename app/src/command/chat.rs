//! Multi-turn conversation command backed by stored history.
//!
//! Every message is one chat turn on the same conversation key, so a later
//! invocation with the same user and thread picks up where this one stopped.

use tracing::info;
use tutorbot_core::{Feature, GradeLevel};
use tutorbot_features::{Assistant, ChatReply, ChatRequest};

use super::{Prompter, init_common_components, is_exit};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub feature: Feature,
    pub user_id: String,
    pub thread_id: String,
    pub grade: GradeLevel,
    pub topic: String,
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
}

impl ChatInput {
    fn request(&self, message: String) -> ChatRequest {
        ChatRequest {
            user_id: self.user_id.clone(),
            thread_id: self.thread_id.clone(),
            grade: self.grade,
            topic: self.topic.clone(),
            message,
        }
    }
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        if !input.feature.supports_chat() {
            anyhow::bail!("{} has no chat mode", input.feature);
        }
        let common = init_common_components().await?;

        info!(
            "Starting {} conversation for user {} thread {}",
            input.feature, input.user_id, input.thread_id
        );

        if let Some(msg) = input.message.clone() {
            let reply = common
                .assistant
                .chat(input.feature, &input.request(msg))
                .await?;
            print_reply(&reply);
        } else {
            run_interactive(&common.assistant, &input).await?;
        }

        Ok(())
    }
}

async fn run_interactive(assistant: &Assistant, input: &ChatInput) -> anyhow::Result<()> {
    println!(
        "=== {} chat: user {}, thread {} ===",
        input.feature, input.user_id, input.thread_id
    );
    println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

    let mut prompter = Prompter::new();
    let mut turns = 0_usize;
    while let Some(line) = prompter.ask("> ").await? {
        if is_exit(&line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match assistant.chat(input.feature, &input.request(line)).await {
            Ok(reply) => {
                turns += 1;
                println!();
                print_reply(&reply);
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    println!("\nSession ended. Turns this session: {turns}");
    Ok(())
}

fn print_reply(reply: &ChatReply) {
    println!("{}\n", reply.response.trim());
    if let Some(questions) = &reply.questions {
        for (i, q) in questions.iter().enumerate() {
            println!("  Q{}: {q}", i + 1);
        }
        println!();
    }
}
