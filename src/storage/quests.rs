//! Quest chains: quests, options, option requirements and requisites.
//!
//! Requirements (an option needs another option chosen earlier) and
//! requisites (an option unlocks a quest) are cross-edges, so they are written
//! only after every quest and option of the payload has a server id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, info, warn};

use super::postgres::{PostgresError, PostgresStore};
use crate::graph::{GraphId, IdMapping};

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestChain {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settlement_id: Option<i32>,
    #[serde(default, rename = "assetID", alias = "assetId")]
    pub asset_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestOptionNode {
    pub id: GraphId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pos_x: f64,
    #[serde(default)]
    pub pos_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_silver: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_item_id: Option<i32>,
    #[serde(default)]
    pub ends_quest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestNode {
    pub id: GraphId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "assetID",
        alias = "assetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    #[serde(default)]
    pub pos_x: f64,
    #[serde(default)]
    pub pos_y: f64,
    /// Option that unlocks this quest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisite_option_id: Option<GraphId>,
    #[serde(default)]
    pub options: Vec<QuestOptionNode>,
}

/// "`option` needs `required` chosen first", by local or server id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_option_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_required_option_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_option_id: Option<i32>,
}

impl Requirement {
    /// Local ids win; server ids are the fallback.
    fn resolve(&self, mapping: &IdMapping) -> Option<(i32, i32)> {
        let side = |local: Option<i64>, server: Option<i32>| {
            local
                .and_then(|l| mapping.resolve(GraphId::Local(l)))
                .or(server)
        };
        Some((
            side(self.local_option_id, self.option_id)?,
            side(self.local_required_option_id, self.required_option_id)?,
        ))
    }
}

/// `saveQuest` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestGraph {
    pub chain_id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quests: Vec<QuestNode>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub deleted_quest_ids: Vec<i32>,
    #[serde(default)]
    pub deleted_option_ids: Vec<i32>,
}

impl QuestGraph {
    pub fn validate(&self) -> Result<(), PostgresError> {
        if self.chain_id <= 0 {
            return Err(PostgresError::validation("chainId: must be a positive id"));
        }
        let mut quests = HashSet::new();
        let mut options = HashSet::new();
        for quest in &self.quests {
            if !quests.insert(quest.id) {
                return Err(PostgresError::validation(format!(
                    "quests: quest id {} listed twice",
                    quest.id
                )));
            }
            for option in &quest.options {
                if !options.insert(option.id) {
                    return Err(PostgresError::validation(format!(
                        "options: option id {} listed twice",
                        option.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestSaved {
    pub chain_id: i32,
    pub quest_mapping: IdMapping,
    pub option_mapping: IdMapping,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestChainDetail {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<i32>,
    #[serde(rename = "assetID", skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    pub quests: Vec<QuestNode>,
    pub requirements: Vec<Requirement>,
}

// ============================================================================
// Rows
// ============================================================================

#[derive(FromRow)]
struct ChainRow {
    id: i32,
    name: String,
    description: Option<String>,
    settlement_id: Option<i32>,
    asset_id: Option<i32>,
}

#[derive(FromRow)]
struct QuestRow {
    id: i32,
    chain_id: i32,
    title: String,
    description: Option<String>,
    asset_id: Option<i32>,
    pos_x: f64,
    pos_y: f64,
    requisite_option_id: Option<i32>,
}

#[derive(FromRow)]
struct QuestOptionRow {
    id: i32,
    quest_id: i32,
    text: String,
    pos_x: f64,
    pos_y: f64,
    reward_silver: Option<i32>,
    reward_item_id: Option<i32>,
    ends_quest: bool,
}

#[derive(FromRow)]
struct RequirementRow {
    chain_id: i32,
    option_id: i32,
    required_option_id: i32,
}

// ============================================================================
// Operations
// ============================================================================

impl PostgresStore {
    /// Every chain with its quests, options and requirements.
    pub async fn list_quest_chains(&self) -> Result<Vec<QuestChainDetail>, PostgresError> {
        let chains = sqlx::query_as::<_, ChainRow>(
            "SELECT id, name, description, settlement_id, asset_id
             FROM game.quest_chains ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        let quests = sqlx::query_as::<_, QuestRow>(
            "SELECT id, chain_id, title, description, asset_id, pos_x, pos_y, requisite_option_id
             FROM game.quests ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        let options = sqlx::query_as::<_, QuestOptionRow>(
            "SELECT id, quest_id, text, pos_x, pos_y, reward_silver, reward_item_id, ends_quest
             FROM game.quest_options ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        let requirements = sqlx::query_as::<_, RequirementRow>(
            "SELECT q.chain_id, r.option_id, r.required_option_id
             FROM game.quest_option_requirements r
             JOIN game.quest_options o ON o.id = r.option_id
             JOIN game.quests q ON q.id = o.quest_id
             ORDER BY r.option_id, r.required_option_id",
        )
        .fetch_all(self.pool())
        .await?;

        let mut options_by_quest: HashMap<i32, Vec<QuestOptionNode>> = HashMap::new();
        for option in options {
            options_by_quest
                .entry(option.quest_id)
                .or_default()
                .push(QuestOptionNode {
                    id: GraphId::Server(option.id),
                    text: option.text,
                    pos_x: option.pos_x,
                    pos_y: option.pos_y,
                    reward_silver: option.reward_silver,
                    reward_item_id: option.reward_item_id,
                    ends_quest: option.ends_quest,
                });
        }

        let mut quests_by_chain: HashMap<i32, Vec<QuestNode>> = HashMap::new();
        for quest in quests {
            quests_by_chain
                .entry(quest.chain_id)
                .or_default()
                .push(QuestNode {
                    id: GraphId::Server(quest.id),
                    title: quest.title,
                    description: quest.description,
                    asset_id: quest.asset_id,
                    asset_url: None,
                    pos_x: quest.pos_x,
                    pos_y: quest.pos_y,
                    requisite_option_id: quest.requisite_option_id.map(GraphId::Server),
                    options: options_by_quest.remove(&quest.id).unwrap_or_default(),
                });
        }

        let mut requirements_by_chain: HashMap<i32, Vec<Requirement>> = HashMap::new();
        for row in requirements {
            requirements_by_chain
                .entry(row.chain_id)
                .or_default()
                .push(Requirement {
                    option_id: Some(row.option_id),
                    required_option_id: Some(row.required_option_id),
                    ..Requirement::default()
                });
        }

        Ok(chains
            .into_iter()
            .map(|chain| QuestChainDetail {
                id: chain.id,
                name: chain.name,
                description: chain.description,
                settlement_id: chain.settlement_id,
                asset_id: chain.asset_id,
                asset_url: None,
                quests: quests_by_chain.remove(&chain.id).unwrap_or_default(),
                requirements: requirements_by_chain.remove(&chain.id).unwrap_or_default(),
            })
            .collect())
    }

    pub async fn create_quest_chain(&self, chain: &NewQuestChain) -> Result<i32, PostgresError> {
        if chain.name.trim().is_empty() {
            return Err(PostgresError::validation("name: must not be empty"));
        }
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO game.quest_chains (name, description, settlement_id, asset_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&chain.name)
        .bind(&chain.description)
        .bind(chain.settlement_id)
        .bind(chain.asset_id)
        .fetch_one(self.pool())
        .await?;
        info!("Created quest chain {} ({})", id, chain.name);
        Ok(id)
    }

    /// Persist a quest chain canvas in one transaction.
    pub async fn save_quest_chain(&self, graph: &QuestGraph) -> Result<QuestSaved, PostgresError> {
        graph.validate()?;
        let chain_id = graph.chain_id;

        let mut tx = self.begin().await?;
        let found: Option<i32> = sqlx::query_scalar(
            "UPDATE game.quest_chains
             SET name = COALESCE($2, name), description = COALESCE($3, description)
             WHERE id = $1
             RETURNING id",
        )
        .bind(chain_id)
        .bind(&graph.name)
        .bind(&graph.description)
        .fetch_optional(&mut *tx)
        .await?;
        if found.is_none() {
            return Err(PostgresError::NotFound(format!("quest chain {}", chain_id)));
        }

        // Deletions
        if !graph.deleted_option_ids.is_empty() {
            let owned: Vec<i32> = sqlx::query_scalar(
                "SELECT o.id FROM game.quest_options o
                 JOIN game.quests q ON q.id = o.quest_id
                 WHERE o.id = ANY($1) AND q.chain_id = $2",
            )
            .bind(&graph.deleted_option_ids)
            .bind(chain_id)
            .fetch_all(&mut *tx)
            .await?;
            delete_options_cascade(&mut tx, &owned).await?;
        }
        if !graph.deleted_quest_ids.is_empty() {
            let quest_ids: Vec<i32> = sqlx::query_scalar(
                "SELECT id FROM game.quests WHERE id = ANY($1) AND chain_id = $2",
            )
            .bind(&graph.deleted_quest_ids)
            .bind(chain_id)
            .fetch_all(&mut *tx)
            .await?;
            delete_quests_cascade(&mut tx, &quest_ids).await?;
        }

        // Quests
        let mut quest_mapping = IdMapping::new();
        for quest in &graph.quests {
            match quest.id {
                GraphId::Local(local) => {
                    let id: i32 = sqlx::query_scalar(
                        "INSERT INTO game.quests (chain_id, title, description, asset_id, pos_x, pos_y)
                         VALUES ($1, $2, $3, $4, $5, $6)
                         RETURNING id",
                    )
                    .bind(chain_id)
                    .bind(&quest.title)
                    .bind(&quest.description)
                    .bind(quest.asset_id)
                    .bind(quest.pos_x)
                    .bind(quest.pos_y)
                    .fetch_one(&mut *tx)
                    .await?;
                    quest_mapping.record(local, id);
                }
                GraphId::Server(id) => {
                    let result = sqlx::query(
                        "UPDATE game.quests
                         SET title = $3, description = $4, asset_id = $5, pos_x = $6, pos_y = $7
                         WHERE id = $1 AND chain_id = $2",
                    )
                    .bind(id)
                    .bind(chain_id)
                    .bind(&quest.title)
                    .bind(&quest.description)
                    .bind(quest.asset_id)
                    .bind(quest.pos_x)
                    .bind(quest.pos_y)
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() == 0 {
                        return Err(PostgresError::validation(format!(
                            "quests: quest {} is not part of chain {}",
                            id, chain_id
                        )));
                    }
                }
            }
        }

        // Options
        let mut option_mapping = IdMapping::new();
        let mut payload_options = Vec::new();
        for quest in &graph.quests {
            let Some(quest_id) = quest_mapping.resolve(quest.id) else {
                continue;
            };
            for option in &quest.options {
                let option_id = match option.id {
                    GraphId::Local(local) => {
                        let id: i32 = sqlx::query_scalar(
                            "INSERT INTO game.quest_options
                                (quest_id, text, pos_x, pos_y, reward_silver, reward_item_id, ends_quest)
                             VALUES ($1, $2, $3, $4, $5, $6, $7)
                             RETURNING id",
                        )
                        .bind(quest_id)
                        .bind(&option.text)
                        .bind(option.pos_x)
                        .bind(option.pos_y)
                        .bind(option.reward_silver)
                        .bind(option.reward_item_id)
                        .bind(option.ends_quest)
                        .fetch_one(&mut *tx)
                        .await?;
                        option_mapping.record(local, id);
                        id
                    }
                    GraphId::Server(id) => {
                        let result = sqlx::query(
                            "UPDATE game.quest_options
                             SET quest_id = $2, text = $3, pos_x = $4, pos_y = $5,
                                 reward_silver = $6, reward_item_id = $7, ends_quest = $8
                             WHERE id = $1
                               AND quest_id IN (SELECT id FROM game.quests WHERE chain_id = $9)",
                        )
                        .bind(id)
                        .bind(quest_id)
                        .bind(&option.text)
                        .bind(option.pos_x)
                        .bind(option.pos_y)
                        .bind(option.reward_silver)
                        .bind(option.reward_item_id)
                        .bind(option.ends_quest)
                        .bind(chain_id)
                        .execute(&mut *tx)
                        .await?;
                        if result.rows_affected() == 0 {
                            return Err(PostgresError::validation(format!(
                                "options: option {} is not part of chain {}",
                                id, chain_id
                            )));
                        }
                        id
                    }
                };
                payload_options.push(option_id);
            }
        }

        // Cross-edges may only point at options this chain still has.
        let chain_options: HashSet<i32> = sqlx::query_scalar(
            "SELECT o.id FROM game.quest_options o
             JOIN game.quests q ON q.id = o.quest_id
             WHERE q.chain_id = $1",
        )
        .bind(chain_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        // Requisites
        for quest in &graph.quests {
            let Some(quest_id) = quest_mapping.resolve(quest.id) else {
                continue;
            };
            let requisite = match quest.requisite_option_id {
                Some(reference) => {
                    let resolved = option_mapping
                        .resolve(reference)
                        .filter(|id| chain_options.contains(id));
                    if resolved.is_none() {
                        warn!(
                            "Quest chain {}: requisite {} of quest {} does not resolve",
                            chain_id, reference, quest_id
                        );
                    }
                    resolved
                }
                None => None,
            };
            sqlx::query("UPDATE game.quests SET requisite_option_id = $2 WHERE id = $1")
                .bind(quest_id)
                .bind(requisite)
                .execute(&mut *tx)
                .await?;
        }

        // Requirements
        if !payload_options.is_empty() {
            sqlx::query("DELETE FROM game.quest_option_requirements WHERE option_id = ANY($1)")
                .bind(&payload_options)
                .execute(&mut *tx)
                .await?;
        }
        for requirement in &graph.requirements {
            match requirement.resolve(&option_mapping) {
                Some((option_id, required))
                    if option_id != required
                        && chain_options.contains(&option_id)
                        && chain_options.contains(&required) =>
                {
                    sqlx::query(
                        "INSERT INTO game.quest_option_requirements (option_id, required_option_id)
                         VALUES ($1, $2)
                         ON CONFLICT DO NOTHING",
                    )
                    .bind(option_id)
                    .bind(required)
                    .execute(&mut *tx)
                    .await?;
                }
                _ => warn!(
                    "Quest chain {}: skipping requirement {:?}",
                    chain_id, requirement
                ),
            }
        }

        tx.commit().await?;
        info!(
            "Saved quest chain {} ({} new quests, {} new options)",
            chain_id,
            quest_mapping.len(),
            option_mapping.len()
        );

        Ok(QuestSaved {
            chain_id,
            quest_mapping,
            option_mapping,
        })
    }

    /// Remove an option, its requirements on either side, and requisite
    /// pointers to it.
    pub async fn delete_quest_option(&self, option_id: i32) -> Result<(), PostgresError> {
        let mut tx = self.begin().await?;
        let removed = delete_options_cascade(&mut tx, &[option_id]).await?;
        if removed == 0 {
            return Err(PostgresError::NotFound(format!("quest option {}", option_id)));
        }
        tx.commit().await?;
        debug!("Deleted quest option {}", option_id);
        Ok(())
    }

    /// Remove a quest after its options.
    pub async fn delete_quest(&self, quest_id: i32) -> Result<(), PostgresError> {
        let mut tx = self.begin().await?;
        let removed = delete_quests_cascade(&mut tx, &[quest_id]).await?;
        if removed == 0 {
            return Err(PostgresError::NotFound(format!("quest {}", quest_id)));
        }
        tx.commit().await?;
        info!("Deleted quest {}", quest_id);
        Ok(())
    }
}

async fn delete_options_cascade(
    tx: &mut Transaction<'static, Postgres>,
    option_ids: &[i32],
) -> Result<u64, PostgresError> {
    if option_ids.is_empty() {
        return Ok(0);
    }
    sqlx::query(
        "DELETE FROM game.quest_option_requirements
         WHERE option_id = ANY($1) OR required_option_id = ANY($1)",
    )
    .bind(option_ids)
    .execute(&mut **tx)
    .await?;
    sqlx::query("UPDATE game.quests SET requisite_option_id = NULL WHERE requisite_option_id = ANY($1)")
        .bind(option_ids)
        .execute(&mut **tx)
        .await?;
    let result = sqlx::query("DELETE FROM game.quest_options WHERE id = ANY($1)")
        .bind(option_ids)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

async fn delete_quests_cascade(
    tx: &mut Transaction<'static, Postgres>,
    quest_ids: &[i32],
) -> Result<u64, PostgresError> {
    if quest_ids.is_empty() {
        return Ok(0);
    }
    let option_ids: Vec<i32> =
        sqlx::query_scalar("SELECT id FROM game.quest_options WHERE quest_id = ANY($1)")
            .bind(quest_ids)
            .fetch_all(&mut **tx)
            .await?;
    delete_options_cascade(tx, &option_ids).await?;
    let result = sqlx::query("DELETE FROM game.quests WHERE id = ANY($1)")
        .bind(quest_ids)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}
