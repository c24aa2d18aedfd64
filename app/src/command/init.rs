use tutorbot_config::{Config, ENV_API_KEY};

/// Writes the default configuration file.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;
        println!("Created config at {}", path.display());
        println!();
        println!("Next steps:");
        println!("  1. Point provider.base_url at your model server (Ollama by default)");
        println!("  2. For an OpenAI-compatible endpoint set provider.kind to \"openai\"");
        println!("     and export {ENV_API_KEY}");
        println!("  3. Run 'tutorbot serve' or 'tutorbot ask tutor --grade college --topic ...'");
        Ok(())
    }
}
