use tutorbot_config::Config;
use tutorbot_core::Feature;
use tutorbot_history::ConversationKey;

use super::open_store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Show,
    Clear,
}

#[derive(Debug, Clone)]
pub struct HistoryInput {
    pub action: HistoryAction,
    pub feature: Feature,
    pub user_id: String,
    pub thread_id: String,
}

/// Prints or deletes the stored turns of one conversation.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    type Input = HistoryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = open_store(&config).await?;
        let key = ConversationKey::new(input.feature.agent_name(), input.user_id, input.thread_id);

        match input.action {
            HistoryAction::Show => {
                let turns = store.read(&key).await?;
                if turns.is_empty() {
                    println!("No history for {key}");
                }
                for turn in turns {
                    println!(
                        "[{}] {}: {}",
                        turn.created_at.format("%Y-%m-%d %H:%M:%S"),
                        turn.speaker.as_str(),
                        turn.content
                    );
                }
            }
            HistoryAction::Clear => {
                let cleared = store.clear(&key).await?;
                println!("Cleared {cleared} turns for {key}");
            }
        }
        Ok(())
    }
}
