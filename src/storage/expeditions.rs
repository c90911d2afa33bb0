//! Expedition graphs: slides, their options, and weighted outcomes.
//!
//! A save submits the whole canvas. New slides carry negative ids, new options
//! carry a negative id or none; everything is resolved inside one transaction
//! and the local-to-server translation is returned to the client.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, info, warn};

use super::postgres::{PostgresError, PostgresStore};
use crate::graph::{GraphId, IdMapping};

// ============================================================================
// Wire shapes (shared by save and load)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub target_slide_id: GraphId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

impl Connection {
    /// Missing and non-positive weights count as 1.
    pub fn effective_weight(&self) -> i32 {
        self.weight.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GraphId>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_required: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy_id: Option<i32>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideNode {
    pub id: GraphId,
    #[serde(default)]
    pub text: String,
    #[serde(
        default,
        rename = "assetID",
        alias = "assetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_value: Option<i32>,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_silver: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_item_id: Option<i32>,
    #[serde(default)]
    pub pos_x: f64,
    #[serde(default)]
    pub pos_y: f64,
    #[serde(default)]
    pub options: Vec<OptionNode>,
}

/// `saveExpedition` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionGraph {
    #[serde(default)]
    pub expedition_id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "assetID", alias = "assetId")]
    pub asset_id: Option<i32>,
    #[serde(default)]
    pub slides: Vec<SlideNode>,
    #[serde(default)]
    pub deleted_slide_ids: Vec<i32>,
    #[serde(default)]
    pub deleted_option_ids: Vec<i32>,
}

impl ExpeditionGraph {
    /// Structural checks that need no database.
    pub fn validate(&self) -> Result<(), PostgresError> {
        let mut seen = HashSet::new();
        for slide in &self.slides {
            if !seen.insert(slide.id) {
                return Err(PostgresError::validation(format!(
                    "slides: slide id {} listed twice",
                    slide.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionSaved {
    pub expedition_id: i32,
    pub slide_mapping: IdMapping,
    /// Keyed `"<slide wire id>-<option index>"`.
    pub option_mapping: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionSummary {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "assetID", skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<i32>,
    pub slide_count: i64,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionDetail {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "assetID", skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    pub slides: Vec<SlideNode>,
}

// ============================================================================
// Rows
// ============================================================================

#[derive(FromRow)]
struct ExpeditionRow {
    id: i32,
    name: String,
    description: Option<String>,
    asset_id: Option<i32>,
}

#[derive(FromRow)]
struct SlideRow {
    id: i32,
    text: String,
    asset_id: Option<i32>,
    effect_id: Option<i32>,
    effect_value: Option<i32>,
    is_start: bool,
    reward_silver: Option<i32>,
    reward_item_id: Option<i32>,
    pos_x: f64,
    pos_y: f64,
}

#[derive(FromRow)]
struct OptionRow {
    id: i32,
    slide_id: i32,
    text: String,
    stat_type: Option<String>,
    stat_required: Option<i32>,
    effect_id: Option<i32>,
    effect_value: Option<i32>,
    enemy_id: Option<i32>,
}

#[derive(FromRow)]
struct OutcomeRow {
    option_id: i32,
    target_slide_id: i32,
    weight: i32,
}

fn option_key(slide: GraphId, index: usize) -> String {
    format!("{}-{}", slide, index)
}

// ============================================================================
// Operations
// ============================================================================

impl PostgresStore {
    pub async fn list_expeditions(&self) -> Result<Vec<ExpeditionSummary>, PostgresError> {
        let rows = sqlx::query_as::<_, ExpeditionSummary>(
            "SELECT e.id, e.name, e.description, e.asset_id, COUNT(s.id) AS slide_count
             FROM game.expeditions e
             LEFT JOIN game.expedition_slides s ON s.expedition_id = e.id
             GROUP BY e.id
             ORDER BY e.id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Load one expedition in the same shape `save_expedition` accepts.
    pub async fn get_expedition(&self, id: i32) -> Result<ExpeditionDetail, PostgresError> {
        let expedition = sqlx::query_as::<_, ExpeditionRow>(
            "SELECT id, name, description, asset_id FROM game.expeditions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| PostgresError::NotFound(format!("expedition {}", id)))?;

        let slides = sqlx::query_as::<_, SlideRow>(
            "SELECT id, text, asset_id, effect_id, effect_value, is_start, reward_silver,
                    reward_item_id, pos_x, pos_y
             FROM game.expedition_slides WHERE expedition_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let options = sqlx::query_as::<_, OptionRow>(
            "SELECT o.id, o.slide_id, o.text, o.stat_type, o.stat_required, o.effect_id,
                    o.effect_value, o.enemy_id
             FROM game.expedition_options o
             JOIN game.expedition_slides s ON s.id = o.slide_id
             WHERE s.expedition_id = $1
             ORDER BY o.slide_id, o.sort_order, o.id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let outcomes = sqlx::query_as::<_, OutcomeRow>(
            "SELECT oc.option_id, oc.target_slide_id, oc.weight
             FROM game.expedition_outcomes oc
             JOIN game.expedition_options o ON o.id = oc.option_id
             JOIN game.expedition_slides s ON s.id = o.slide_id
             WHERE s.expedition_id = $1
             ORDER BY oc.id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        let mut connections: HashMap<i32, Vec<Connection>> = HashMap::new();
        for outcome in outcomes {
            connections
                .entry(outcome.option_id)
                .or_default()
                .push(Connection {
                    target_slide_id: GraphId::Server(outcome.target_slide_id),
                    weight: Some(outcome.weight),
                });
        }

        let mut options_by_slide: HashMap<i32, Vec<OptionNode>> = HashMap::new();
        for option in options {
            options_by_slide
                .entry(option.slide_id)
                .or_default()
                .push(OptionNode {
                    id: Some(GraphId::Server(option.id)),
                    text: option.text,
                    stat_type: option.stat_type,
                    stat_required: option.stat_required,
                    effect_id: option.effect_id,
                    effect_value: option.effect_value,
                    enemy_id: option.enemy_id,
                    connections: connections.remove(&option.id).unwrap_or_default(),
                });
        }

        let slides = slides
            .into_iter()
            .map(|slide| SlideNode {
                id: GraphId::Server(slide.id),
                text: slide.text,
                asset_id: slide.asset_id,
                asset_url: None,
                effect_id: slide.effect_id,
                effect_value: slide.effect_value,
                is_start: slide.is_start,
                reward_silver: slide.reward_silver,
                reward_item_id: slide.reward_item_id,
                pos_x: slide.pos_x,
                pos_y: slide.pos_y,
                options: options_by_slide.remove(&slide.id).unwrap_or_default(),
            })
            .collect();

        Ok(ExpeditionDetail {
            id: expedition.id,
            name: expedition.name,
            description: expedition.description,
            asset_id: expedition.asset_id,
            asset_url: None,
            slides,
        })
    }

    /// Persist a whole expedition canvas in one transaction.
    pub async fn save_expedition(
        &self,
        graph: &ExpeditionGraph,
    ) -> Result<ExpeditionSaved, PostgresError> {
        graph.validate()?;

        let mut tx = self.begin().await?;
        let expedition_id = upsert_expedition(&mut tx, graph).await?;

        if !graph.deleted_option_ids.is_empty() {
            sqlx::query(
                "DELETE FROM game.expedition_options
                 WHERE id = ANY($1)
                   AND slide_id IN (SELECT id FROM game.expedition_slides WHERE expedition_id = $2)",
            )
            .bind(&graph.deleted_option_ids)
            .bind(expedition_id)
            .execute(&mut *tx)
            .await?;
        }
        if !graph.deleted_slide_ids.is_empty() {
            // Only slides of this expedition; other ids are ignored.
            let owned: Vec<i32> = sqlx::query_scalar(
                "SELECT id FROM game.expedition_slides WHERE id = ANY($1) AND expedition_id = $2",
            )
            .bind(&graph.deleted_slide_ids)
            .bind(expedition_id)
            .fetch_all(&mut *tx)
            .await?;
            if owned.len() < graph.deleted_slide_ids.len() {
                warn!(
                    "Expedition {}: ignoring deleted slide ids outside this expedition",
                    expedition_id
                );
            }
            if !owned.is_empty() {
                sqlx::query("DELETE FROM game.expedition_outcomes WHERE target_slide_id = ANY($1)")
                    .bind(&owned)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM game.expedition_slides WHERE id = ANY($1)")
                    .bind(&owned)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        // Slides
        let mut slide_mapping = IdMapping::new();
        for slide in &graph.slides {
            match slide.id {
                GraphId::Local(local) => {
                    let id = insert_slide(&mut tx, expedition_id, slide).await?;
                    slide_mapping.record(local, id);
                }
                GraphId::Server(id) => update_slide(&mut tx, expedition_id, id, slide).await?,
            }
        }

        // Targets the client referenced but never listed.
        for slide in &graph.slides {
            for option in &slide.options {
                for connection in &option.connections {
                    if let GraphId::Local(local) = connection.target_slide_id {
                        if !slide_mapping.contains_local(local) {
                            let placeholder = SlideNode {
                                id: GraphId::Local(local),
                                text: String::new(),
                                asset_id: None,
                                asset_url: None,
                                effect_id: None,
                                effect_value: None,
                                is_start: false,
                                reward_silver: None,
                                reward_item_id: None,
                                pos_x: 0.0,
                                pos_y: 0.0,
                                options: Vec::new(),
                            };
                            let id = insert_slide(&mut tx, expedition_id, &placeholder).await?;
                            info!(
                                "Expedition {}: auto-created slide {} for unlisted target {}",
                                expedition_id, id, local
                            );
                            slide_mapping.record(local, id);
                        }
                    }
                }
            }
        }

        let own_slides: HashSet<i32> = sqlx::query_scalar(
            "SELECT id FROM game.expedition_slides WHERE expedition_id = $1",
        )
        .bind(expedition_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        // Options and their connections
        let mut option_mapping = BTreeMap::new();
        for slide in &graph.slides {
            let Some(slide_id) = slide_mapping.resolve(slide.id) else {
                continue;
            };
            for (index, option) in slide.options.iter().enumerate() {
                let option_id = match option.id {
                    Some(GraphId::Server(id)) => {
                        update_option(&mut tx, slide_id, id, index, option).await?;
                        sqlx::query("DELETE FROM game.expedition_outcomes WHERE option_id = $1")
                            .bind(id)
                            .execute(&mut *tx)
                            .await?;
                        id
                    }
                    Some(GraphId::Local(_)) | None => {
                        let id = insert_option(&mut tx, slide_id, index, option).await?;
                        option_mapping.insert(option_key(slide.id, index), id);
                        id
                    }
                };

                for connection in &option.connections {
                    let target = match slide_mapping.resolve(connection.target_slide_id) {
                        Some(target) if own_slides.contains(&target) => target,
                        _ => {
                            warn!(
                                "Expedition {}: skipping connection from option {} to unknown slide {}",
                                expedition_id, option_id, connection.target_slide_id
                            );
                            continue;
                        }
                    };
                    sqlx::query(
                        "INSERT INTO game.expedition_outcomes (option_id, target_slide_id, weight)
                         VALUES ($1, $2, $3)",
                    )
                    .bind(option_id)
                    .bind(target)
                    .bind(connection.effective_weight())
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        info!(
            "Saved expedition {} ({} new slides, {} new options)",
            expedition_id,
            slide_mapping.len(),
            option_mapping.len()
        );

        Ok(ExpeditionSaved {
            expedition_id,
            slide_mapping,
            option_mapping,
        })
    }

    /// Remove a slide together with every outcome leading to it.
    pub async fn delete_expedition_slide(&self, slide_id: i32) -> Result<(), PostgresError> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM game.expedition_outcomes WHERE target_slide_id = $1")
            .bind(slide_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM game.expedition_slides WHERE id = $1")
            .bind(slide_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("expedition slide {}", slide_id)));
        }
        tx.commit().await?;
        debug!("Deleted expedition slide {}", slide_id);
        Ok(())
    }

    pub async fn delete_expedition_option(&self, option_id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM game.expedition_options WHERE id = $1")
            .bind(option_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("expedition option {}", option_id)));
        }
        debug!("Deleted expedition option {}", option_id);
        Ok(())
    }

    pub async fn delete_expedition(&self, expedition_id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM game.expeditions WHERE id = $1")
            .bind(expedition_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("expedition {}", expedition_id)));
        }
        info!("Deleted expedition {}", expedition_id);
        Ok(())
    }
}

async fn upsert_expedition(
    tx: &mut Transaction<'static, Postgres>,
    graph: &ExpeditionGraph,
) -> Result<i32, PostgresError> {
    match graph.expedition_id {
        Some(id) => {
            let updated: Option<i32> = sqlx::query_scalar(
                "UPDATE game.expeditions
                 SET name = COALESCE($2, name),
                     description = COALESCE($3, description),
                     asset_id = COALESCE($4, asset_id)
                 WHERE id = $1
                 RETURNING id",
            )
            .bind(id)
            .bind(&graph.name)
            .bind(&graph.description)
            .bind(graph.asset_id)
            .fetch_optional(&mut **tx)
            .await?;
            updated.ok_or_else(|| PostgresError::NotFound(format!("expedition {}", id)))
        }
        None => {
            let id: i32 = sqlx::query_scalar(
                "INSERT INTO game.expeditions (name, description, asset_id)
                 VALUES ($1, $2, $3)
                 RETURNING id",
            )
            .bind(graph.name.clone().unwrap_or_default())
            .bind(&graph.description)
            .bind(graph.asset_id)
            .fetch_one(&mut **tx)
            .await?;
            Ok(id)
        }
    }
}

async fn insert_slide(
    tx: &mut Transaction<'static, Postgres>,
    expedition_id: i32,
    slide: &SlideNode,
) -> Result<i32, PostgresError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO game.expedition_slides
            (expedition_id, text, asset_id, effect_id, effect_value, is_start,
             reward_silver, reward_item_id, pos_x, pos_y)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(expedition_id)
    .bind(&slide.text)
    .bind(slide.asset_id)
    .bind(slide.effect_id)
    .bind(slide.effect_value)
    .bind(slide.is_start)
    .bind(slide.reward_silver)
    .bind(slide.reward_item_id)
    .bind(slide.pos_x)
    .bind(slide.pos_y)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn update_slide(
    tx: &mut Transaction<'static, Postgres>,
    expedition_id: i32,
    slide_id: i32,
    slide: &SlideNode,
) -> Result<(), PostgresError> {
    let result = sqlx::query(
        "UPDATE game.expedition_slides
         SET text = $3, asset_id = $4, effect_id = $5, effect_value = $6, is_start = $7,
             reward_silver = $8, reward_item_id = $9, pos_x = $10, pos_y = $11
         WHERE id = $1 AND expedition_id = $2",
    )
    .bind(slide_id)
    .bind(expedition_id)
    .bind(&slide.text)
    .bind(slide.asset_id)
    .bind(slide.effect_id)
    .bind(slide.effect_value)
    .bind(slide.is_start)
    .bind(slide.reward_silver)
    .bind(slide.reward_item_id)
    .bind(slide.pos_x)
    .bind(slide.pos_y)
    .execute(&mut **tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PostgresError::validation(format!(
            "slides: slide {} is not part of expedition {}",
            slide_id, expedition_id
        )));
    }
    Ok(())
}

async fn insert_option(
    tx: &mut Transaction<'static, Postgres>,
    slide_id: i32,
    index: usize,
    option: &OptionNode,
) -> Result<i32, PostgresError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO game.expedition_options
            (slide_id, sort_order, text, stat_type, stat_required, effect_id, effect_value, enemy_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id",
    )
    .bind(slide_id)
    .bind(sort_order(index))
    .bind(&option.text)
    .bind(&option.stat_type)
    .bind(option.stat_required)
    .bind(option.effect_id)
    .bind(option.effect_value)
    .bind(option.enemy_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn update_option(
    tx: &mut Transaction<'static, Postgres>,
    slide_id: i32,
    option_id: i32,
    index: usize,
    option: &OptionNode,
) -> Result<(), PostgresError> {
    let result = sqlx::query(
        "UPDATE game.expedition_options
         SET sort_order = $3, text = $4, stat_type = $5, stat_required = $6,
             effect_id = $7, effect_value = $8, enemy_id = $9
         WHERE id = $1 AND slide_id = $2",
    )
    .bind(option_id)
    .bind(slide_id)
    .bind(sort_order(index))
    .bind(&option.text)
    .bind(&option.stat_type)
    .bind(option.stat_required)
    .bind(option.effect_id)
    .bind(option.effect_value)
    .bind(option.enemy_id)
    .execute(&mut **tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PostgresError::validation(format!(
            "options: option {} is not part of slide {}",
            option_id, slide_id
        )));
    }
    Ok(())
}

fn sort_order(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_weight_coercion() {
        let weights = [(None, 1), (Some(0), 1), (Some(-4), 1), (Some(3), 3)];
        for (weight, expected) in weights {
            let connection = Connection {
                target_slide_id: GraphId::Local(-2),
                weight,
            };
            assert_eq!(connection.effective_weight(), expected);
        }
    }

    #[test]
    fn test_save_request_parses_minimal_canvas() {
        let graph: ExpeditionGraph = serde_json::from_value(json!({
            "slides": [
                {"id": -1, "text": "start", "isStart": true, "options": [
                    {"text": "flee", "connections": [{"targetSlideId": -2, "weight": 0}]}
                ]},
                {"id": -2, "text": "end", "isStart": false, "options": []}
            ]
        }))
        .unwrap();

        assert_eq!(graph.expedition_id, None);
        assert_eq!(graph.slides.len(), 2);
        assert_eq!(graph.slides[0].options[0].id, None);
        assert_eq!(
            graph.slides[0].options[0].connections[0].target_slide_id,
            GraphId::Local(-2)
        );
        assert!(graph.deleted_slide_ids.is_empty());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_zero_slide_id_rejected() {
        let result = serde_json::from_value::<ExpeditionGraph>(json!({
            "slides": [{"id": 0, "text": "bad"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_slide_ids_rejected() {
        let graph: ExpeditionGraph = serde_json::from_value(json!({
            "slides": [{"id": -1}, {"id": -1}]
        }))
        .unwrap();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_option_key_uses_slide_wire_id() {
        assert_eq!(option_key(GraphId::Local(-1), 0), "-1-0");
        assert_eq!(option_key(GraphId::Server(101), 2), "101-2");
    }

    #[test]
    fn test_loaded_slide_serialises_like_request() {
        let slide = SlideNode {
            id: GraphId::Server(101),
            text: "start".into(),
            asset_id: None,
            asset_url: None,
            effect_id: None,
            effect_value: None,
            is_start: true,
            reward_silver: None,
            reward_item_id: None,
            pos_x: 10.0,
            pos_y: 20.0,
            options: vec![],
        };
        let value = serde_json::to_value(&slide).unwrap();
        assert_eq!(
            value,
            json!({"id": 101, "text": "start", "isStart": true, "posX": 10.0, "posY": 20.0, "options": []})
        );
        let back: SlideNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, slide);
    }
}
