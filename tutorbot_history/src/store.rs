use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Schema, Set, TransactionTrait,
};
use tracing::{debug, error, info};
use tutorbot_entities::{agents, turns};

use crate::{ConversationKey, HistoryError, Result, Speaker, Turn};

/// Append-only log of conversation turns.
///
/// Each call queries storage afresh; nothing is cached between calls.
#[derive(Clone)]
pub struct HistoryStore {
    db: DatabaseConnection,
}

async fn agent_id<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32> {
    agents::Entity::find()
        .filter(agents::Column::Name.eq(name))
        .one(conn)
        .await?
        .map(|agent| agent.id)
        .ok_or_else(|| HistoryError::UnknownAgent(name.to_string()))
}

async fn insert_turn<C: ConnectionTrait>(
    conn: &C,
    agent_id: i32,
    key: &ConversationKey,
    speaker: Speaker,
    text: &str,
) -> Result<Turn> {
    let model = turns::ActiveModel {
        agent_id: Set(agent_id),
        user_id: Set(key.user_id.clone()),
        thread_id: Set(key.thread_id.clone()),
        role: Set(speaker.as_str().to_string()),
        content: Set(text.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    debug!("Appended {} turn {} to {}", speaker.as_str(), model.id, key);
    Ok(Turn {
        id: model.id,
        speaker,
        content: model.content,
        created_at: model.created_at,
    })
}

impl HistoryStore {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to history database: {}", url);
        let mut options = ConnectOptions::new(url);
        options.sqlx_logging(false);
        if url.contains(":memory:") {
            // Each pooled connection would otherwise open its own empty database.
            options.max_connections(1).min_connections(1);
        }
        let db = Database::connect(options).await?;
        Ok(Self::from_connection(db))
    }

    #[must_use]
    pub const fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates the `agents` and `turns` tables when they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut agents_table = schema.create_table_from_entity(agents::Entity);
        self.db
            .execute(backend.build(agents_table.if_not_exists()))
            .await?;

        let mut turns_table = schema.create_table_from_entity(turns::Entity);
        self.db
            .execute(backend.build(turns_table.if_not_exists()))
            .await?;

        info!("History schema ready");
        Ok(())
    }

    /// Returns the id of `name` in the lookup table, inserting it first if needed.
    pub async fn register_agent(&self, name: &str) -> Result<i32> {
        match agent_id(&self.db, name).await {
            Ok(id) => return Ok(id),
            Err(HistoryError::UnknownAgent(_)) => {}
            Err(e) => return Err(e),
        }

        let inserted = agents::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(model) => {
                debug!("Registered agent {} with id {}", name, model.id);
                Ok(model.id)
            }
            // Lost a race with a concurrent registration.
            Err(e) => agent_id(&self.db, name).await.map_err(|_| e.into()),
        }
    }

    pub async fn agents(&self) -> Result<Vec<String>> {
        Ok(agents::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|agent| agent.name)
            .collect())
    }

    pub async fn append(&self, key: &ConversationKey, speaker: Speaker, text: &str) -> Result<Turn> {
        async {
            let agent_id = agent_id(&self.db, &key.agent).await?;
            let txn = self.db.begin().await?;
            let turn = insert_turn(&txn, agent_id, key, speaker, text).await?;
            txn.commit().await?;
            Ok::<_, HistoryError>(turn)
        }
        .await
        .inspect_err(|e| error!("Failed to append turn to {}: {}", key, e))
    }

    /// Appends a human turn and its reply in one transaction.
    ///
    /// The two rows get adjacent ids even when other exchanges on the same key
    /// commit concurrently, and a cancelled call leaves neither row behind.
    pub async fn append_exchange(
        &self,
        key: &ConversationKey,
        human: &str,
        assistant: &str,
    ) -> Result<(Turn, Turn)> {
        async {
            let agent_id = agent_id(&self.db, &key.agent).await?;
            let txn = self.db.begin().await?;
            let asked = insert_turn(&txn, agent_id, key, Speaker::Human, human).await?;
            let answered = insert_turn(&txn, agent_id, key, Speaker::Assistant, assistant).await?;
            txn.commit().await?;
            Ok::<_, HistoryError>((asked, answered))
        }
        .await
        .inspect_err(|e| error!("Failed to append exchange to {}: {}", key, e))
    }

    /// All turns of `key` in append order. Empty when nothing was written.
    pub async fn read(&self, key: &ConversationKey) -> Result<Vec<Turn>> {
        let agent_id = agent_id(&self.db, &key.agent).await?;

        let rows = turns::Entity::find()
            .filter(turns::Column::AgentId.eq(agent_id))
            .filter(turns::Column::UserId.eq(key.user_id.as_str()))
            .filter(turns::Column::ThreadId.eq(key.thread_id.as_str()))
            .order_by_asc(turns::Column::Id)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Turn {
                    id: row.id,
                    speaker: row.role.parse()?,
                    content: row.content,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    /// Deletes every turn of `key`, returning how many were removed.
    pub async fn clear(&self, key: &ConversationKey) -> Result<u64> {
        let result = async {
            let agent_id = agent_id(&self.db, &key.agent).await?;
            let deleted = turns::Entity::delete_many()
                .filter(turns::Column::AgentId.eq(agent_id))
                .filter(turns::Column::UserId.eq(key.user_id.as_str()))
                .filter(turns::Column::ThreadId.eq(key.thread_id.as_str()))
                .exec(&self.db)
                .await?;
            Ok::<_, HistoryError>(deleted.rows_affected)
        }
        .await;

        match &result {
            Ok(n) => info!("Cleared {} turns from {}", n, key),
            Err(e) => error!("Failed to clear history of {}: {}", key, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> HistoryStore {
        let store = HistoryStore::connect("sqlite::memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        store.register_agent("tutor").await.unwrap();
        store.register_agent("five-question").await.unwrap();
        store
    }

    fn key(thread: &str) -> ConversationKey {
        ConversationKey::new("tutor", "u1", thread)
    }

    #[tokio::test]
    async fn never_written_key_reads_empty() {
        let store = store().await;
        assert!(store.read(&key("t1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_returns_turns_in_append_order() {
        let store = store().await;
        let k = key("t1");
        for (speaker, text) in [
            (Speaker::Human, "what is a cell?"),
            (Speaker::Assistant, "the unit of life"),
            (Speaker::Human, "and a tissue?"),
            (Speaker::Assistant, "a group of cells"),
        ] {
            store.append(&k, speaker, text).await.unwrap();
        }

        let turns = store.read(&k).await.unwrap();
        let seen: Vec<_> = turns.iter().map(|t| (t.speaker, t.content.as_str())).collect();
        assert_eq!(
            seen,
            vec![
                (Speaker::Human, "what is a cell?"),
                (Speaker::Assistant, "the unit of life"),
                (Speaker::Human, "and a tissue?"),
                (Speaker::Assistant, "a group of cells"),
            ]
        );
        assert!(turns.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let store = store().await;
        store.append(&key("t1"), Speaker::Human, "a").await.unwrap();
        store
            .append(&ConversationKey::new("five-question", "u1", "t1"), Speaker::Human, "b")
            .await
            .unwrap();
        store
            .append(&ConversationKey::new("tutor", "u2", "t1"), Speaker::Human, "c")
            .await
            .unwrap();

        let turns = store.read(&key("t1")).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "a");
        assert!(store.read(&key("t2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_only_that_key() {
        let store = store().await;
        store.append(&key("t1"), Speaker::Human, "a").await.unwrap();
        store.append(&key("t1"), Speaker::Assistant, "b").await.unwrap();
        store.append(&key("t2"), Speaker::Human, "c").await.unwrap();

        assert_eq!(store.clear(&key("t1")).await.unwrap(), 2);
        assert!(store.read(&key("t1")).await.unwrap().is_empty());
        assert_eq!(store.read(&key("t2")).await.unwrap().len(), 1);
        assert_eq!(store.clear(&key("t1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_agent_fails_every_operation() {
        let store = store().await;
        let k = ConversationKey::new("astrology", "u1", "t1");

        assert!(matches!(
            store.append(&k, Speaker::Human, "x").await,
            Err(HistoryError::UnknownAgent(name)) if name == "astrology"
        ));
        assert!(matches!(store.read(&k).await, Err(HistoryError::UnknownAgent(_))));
        assert!(matches!(store.clear(&k).await, Err(HistoryError::UnknownAgent(_))));
    }

    #[tokio::test]
    async fn register_agent_is_idempotent() {
        let store = store().await;
        let first = store.register_agent("tutor").await.unwrap();
        let second = store.register_agent("tutor").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.agents().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ensure_schema_can_run_twice() {
        let store = store().await;
        store.ensure_schema().await.unwrap();
        store.append(&key("t1"), Speaker::Human, "still here").await.unwrap();
        assert_eq!(store.read(&key("t1")).await.unwrap().len(), 1);
    }

    async fn file_store(tag: &str) -> HistoryStore {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "tutorbot-history-{tag}-{}-{nanos}.db",
            std::process::id()
        ));
        let store = HistoryStore::connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap();
        store.ensure_schema().await.unwrap();
        store.register_agent("tutor").await.unwrap();
        store
    }

    #[tokio::test]
    async fn exchange_is_stored_as_adjacent_pair() {
        let store = store().await;
        let k = key("t1");
        let (asked, answered) = store.append_exchange(&k, "why?", "because").await.unwrap();
        assert_eq!(asked.speaker, Speaker::Human);
        assert_eq!(answered.speaker, Speaker::Assistant);
        assert_eq!(answered.id, asked.id + 1);

        let turns = store.read(&k).await.unwrap();
        let seen: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(seen, vec!["why?", "because"]);
    }

    #[tokio::test]
    async fn failed_exchange_writes_nothing() {
        let store = store().await;
        let k = ConversationKey::new("astrology", "u1", "t1");
        assert!(matches!(
            store.append_exchange(&k, "q", "a").await,
            Err(HistoryError::UnknownAgent(_))
        ));
        assert!(turns::Entity::find().all(store.connection()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_exchanges_on_one_key_never_interleave() {
        let store = file_store("exchange").await;
        let k = key("shared");

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let k = k.clone();
                tokio::spawn(async move {
                    store
                        .append_exchange(&k, &format!("h{i}"), &format!("a{i}"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let turns = store.read(&k).await.unwrap();
        assert_eq!(turns.len(), 32);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].speaker, Speaker::Human);
            assert_eq!(pair[1].speaker, Speaker::Assistant);
            assert_eq!(
                pair[0].content.trim_start_matches('h'),
                pair[1].content.trim_start_matches('a')
            );
        }
    }

    #[tokio::test]
    async fn read_order_follows_ids_not_timestamps() {
        let store = store().await;
        let k = key("t1");
        let first = store.append(&k, Speaker::Human, "first").await.unwrap();
        store.append(&k, Speaker::Assistant, "second").await.unwrap();

        // Move the first turn's clock forward, as after a backwards clock step.
        let mut row: turns::ActiveModel = turns::Entity::find_by_id(first.id)
            .one(store.connection())
            .await
            .unwrap()
            .unwrap()
            .into();
        row.created_at = Set(Utc::now() + chrono::Duration::hours(1));
        row.update(store.connection()).await.unwrap();

        let seen: Vec<_> = store
            .read(&k)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(seen, vec!["first", "second"]);
    }

    #[test]
    fn speaker_labels() {
        assert_eq!(Speaker::Human.as_str(), "human");
        assert_eq!("assistant".parse::<Speaker>().unwrap(), Speaker::Assistant);
        assert!("ai".parse::<Speaker>().is_err());
    }
}
