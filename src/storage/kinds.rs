//! Editable content kinds: items, perks, enemies, talents.
//!
//! Each struct is the typed attribute set shared by the live and pending
//! tables; [`Content`] wires it into the generic repository.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::content::{Content, PgQuery};
use super::postgres::PostgresError;
use crate::assets::AssetCategory;

// ============================================================================
// Enumerations
// ============================================================================

/// Parsed from and written as its lowercase name; see `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Head,
    Chest,
    Hands,
    Legs,
    Feet,
    Weapon,
    Offhand,
    Ring,
    Amulet,
    Consumable,
}

impl ItemType {
    pub const ALL: [ItemType; 10] = [
        ItemType::Head,
        ItemType::Chest,
        ItemType::Hands,
        ItemType::Legs,
        ItemType::Feet,
        ItemType::Weapon,
        ItemType::Offhand,
        ItemType::Ring,
        ItemType::Amulet,
        ItemType::Consumable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Head => "head",
            ItemType::Chest => "chest",
            ItemType::Hands => "hands",
            ItemType::Legs => "legs",
            ItemType::Feet => "feet",
            ItemType::Weapon => "weapon",
            ItemType::Offhand => "offhand",
            ItemType::Ring => "ring",
            ItemType::Amulet => "amulet",
            ItemType::Consumable => "consumable",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = PostgresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                PostgresError::validation(format!(
                    "type: unknown item type `{}` (expected one of {})",
                    s,
                    ItemType::ALL.map(ItemType::as_str).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatType {
    Strength,
    Stamina,
    Agility,
    Luck,
    Armor,
}

impl StatType {
    pub const ALL: [StatType; 5] = [
        StatType::Strength,
        StatType::Stamina,
        StatType::Agility,
        StatType::Luck,
        StatType::Armor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Strength => "strength",
            StatType::Stamina => "stamina",
            StatType::Agility => "agility",
            StatType::Luck => "luck",
            StatType::Armor => "armor",
        }
    }

    /// Parse a stat name, naming `field` in the error.
    pub fn parse_field(field: &str, s: &str) -> Result<Self, PostgresError> {
        StatType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                PostgresError::validation(format!(
                    "{}: unknown stat type `{}` (expected one of {})",
                    field,
                    s,
                    StatType::ALL.map(StatType::as_str).join(", ")
                ))
            })
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{stat, value}` entry of an item or perk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: String,
    pub value: i32,
}

fn require_name(name: &str) -> Result<(), PostgresError> {
    if name.trim().is_empty() {
        return Err(PostgresError::validation("name: must not be empty"));
    }
    Ok(())
}

fn validate_stats(stats: &[StatModifier]) -> Result<(), PostgresError> {
    for (i, modifier) in stats.iter().enumerate() {
        StatType::parse_field(&format!("stats[{}].stat", i), &modifier.stat)?;
    }
    Ok(())
}

fn require_at_least(field: &str, value: i32, min: i32) -> Result<(), PostgresError> {
    if value < min {
        return Err(PostgresError::validation(format!(
            "{}: must be at least {} (got {})",
            field, min, value
        )));
    }
    Ok(())
}

fn one() -> i32 {
    1
}

// ============================================================================
// Item
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "assetID",
        alias = "assetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_id: Option<i32>,
    #[serde(default)]
    pub silver: i32,
    #[serde(default)]
    pub socket: bool,
    #[serde(default)]
    #[sqlx(json)]
    pub stats: Vec<StatModifier>,
}

impl Content for Item {
    const TABLE: &'static str = "items";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "item_type",
        "description",
        "asset_id",
        "silver",
        "socket",
        "stats",
    ];
    const CATEGORY: AssetCategory = AssetCategory::Items;
    const SINGULAR: &'static str = "Item";
    const PLURAL: &'static str = "Items";

    fn validate(&self) -> Result<(), PostgresError> {
        require_name(&self.name)?;
        self.item_type.parse::<ItemType>()?;
        require_at_least("silver", self.silver, 0)?;
        validate_stats(&self.stats)
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.item_type.clone())
            .bind(self.description.clone())
            .bind(self.asset_id)
            .bind(self.silver)
            .bind(self.socket)
            .bind(Json(self.stats.clone()))
    }

    fn asset_id(&self) -> Option<i32> {
        self.asset_id
    }
}

// ============================================================================
// Perk
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Perk {
    pub name: String,
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
    pub effect_id: Option<i32>,
    #[serde(default)]
    #[sqlx(json)]
    pub stats: Vec<StatModifier>,
}

impl Content for Perk {
    const TABLE: &'static str = "perks";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "asset_id", "effect_id", "stats"];
    const CATEGORY: AssetCategory = AssetCategory::Perks;
    const SINGULAR: &'static str = "Perk";
    const PLURAL: &'static str = "Perks";

    fn validate(&self) -> Result<(), PostgresError> {
        require_name(&self.name)?;
        validate_stats(&self.stats)
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.description.clone())
            .bind(self.asset_id)
            .bind(self.effect_id)
            .bind(Json(self.stats.clone()))
    }

    fn asset_id(&self) -> Option<i32> {
        self.asset_id
    }
}

// ============================================================================
// Enemy
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "assetID",
        alias = "assetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_id: Option<i32>,
    #[serde(default = "one")]
    pub level: i32,
    #[serde(default = "one")]
    pub health: i32,
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub stamina: i32,
    #[serde(default)]
    pub agility: i32,
    #[serde(default)]
    pub luck: i32,
    #[serde(default)]
    pub armor: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<i32>,
}

impl Content for Enemy {
    const TABLE: &'static str = "enemies";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "asset_id",
        "level",
        "health",
        "strength",
        "stamina",
        "agility",
        "luck",
        "armor",
        "effect_id",
    ];
    const CATEGORY: AssetCategory = AssetCategory::Enemies;
    const SINGULAR: &'static str = "Enemy";
    const PLURAL: &'static str = "Enemies";

    fn validate(&self) -> Result<(), PostgresError> {
        require_name(&self.name)?;
        require_at_least("level", self.level, 1)?;
        require_at_least("health", self.health, 1)
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.description.clone())
            .bind(self.asset_id)
            .bind(self.level)
            .bind(self.health)
            .bind(self.strength)
            .bind(self.stamina)
            .bind(self.agility)
            .bind(self.luck)
            .bind(self.armor)
            .bind(self.effect_id)
    }

    fn asset_id(&self) -> Option<i32> {
        self.asset_id
    }
}

// ============================================================================
// Talent
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Talent {
    pub name: String,
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
    pub perk_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_talent_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(default)]
    pub value: i32,
    #[serde(default = "one")]
    pub tier: i32,
}

impl Content for Talent {
    const TABLE: &'static str = "talents";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "asset_id",
        "perk_id",
        "required_talent_id",
        "stat",
        "value",
        "tier",
    ];
    const CATEGORY: AssetCategory = AssetCategory::Talents;
    const SINGULAR: &'static str = "Talent";
    const PLURAL: &'static str = "Talents";

    fn validate(&self) -> Result<(), PostgresError> {
        require_name(&self.name)?;
        if let Some(stat) = &self.stat {
            StatType::parse_field("stat", stat)?;
        }
        require_at_least("tier", self.tier, 1)
    }

    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.description.clone())
            .bind(self.asset_id)
            .bind(self.perk_id)
            .bind(self.required_talent_id)
            .bind(self.stat.clone())
            .bind(self.value)
            .bind(self.tier)
    }

    fn asset_id(&self) -> Option<i32> {
        self.asset_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn helm() -> Item {
        serde_json::from_value(json!({
            "name": "Iron Helm",
            "type": "head",
            "assetID": 12,
            "silver": 10,
            "socket": false
        }))
        .unwrap()
    }

    #[test]
    fn test_item_wire_names() {
        let item = helm();
        assert_eq!(item.item_type, "head");
        assert_eq!(item.asset_id, Some(12));
        assert!(item.stats.is_empty());
        assert!(item.validate().is_ok());

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["type"], "head");
        assert_eq!(out["assetID"], 12);
        assert!(out.get("description").is_none());
    }

    #[test]
    fn test_asset_id_alias_and_null() {
        let perk: Perk =
            serde_json::from_value(json!({"name": "Keen", "assetId": 3, "effectId": null}))
                .unwrap();
        assert_eq!(perk.asset_id, Some(3));
        assert_eq!(perk.effect_id, None);
    }

    #[test]
    fn test_unknown_item_type_names_field() {
        let mut item = helm();
        item.item_type = "hat".into();
        let err = item.validate().unwrap_err().to_string();
        assert!(err.starts_with("type: unknown item type `hat`"), "{}", err);
    }

    #[test]
    fn test_item_rejects_negative_silver_and_bad_stat() {
        let mut item = helm();
        item.silver = -1;
        assert!(item.validate().unwrap_err().to_string().starts_with("silver"));

        let mut item = helm();
        item.stats = vec![StatModifier {
            stat: "charisma".into(),
            value: 2,
        }];
        assert!(item
            .validate()
            .unwrap_err()
            .to_string()
            .starts_with("stats[0].stat"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut item = helm();
        item.name = "  ".into();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_enemy_defaults_and_bounds() {
        let enemy: Enemy = serde_json::from_value(json!({"name": "Rat"})).unwrap();
        assert_eq!(enemy.level, 1);
        assert_eq!(enemy.health, 1);
        assert!(enemy.validate().is_ok());

        let enemy: Enemy =
            serde_json::from_value(json!({"name": "Ghost", "health": 0})).unwrap();
        assert!(enemy.validate().unwrap_err().to_string().starts_with("health"));
    }

    #[test]
    fn test_talent_stat_checked_when_present() {
        let talent: Talent =
            serde_json::from_value(json!({"name": "Grit", "stat": "stamina", "value": 2}))
                .unwrap();
        assert!(talent.validate().is_ok());

        let talent: Talent =
            serde_json::from_value(json!({"name": "Grit", "stat": "mana"})).unwrap();
        assert!(talent.validate().unwrap_err().to_string().starts_with("stat:"));
    }

    #[test]
    fn test_column_lists_match_table_layout() {
        assert_eq!(Item::COLUMNS.len(), 7);
        assert_eq!(Perk::COLUMNS.len(), 5);
        assert_eq!(Enemy::COLUMNS.len(), 11);
        assert_eq!(Talent::COLUMNS.len(), 8);
        for column in Item::COLUMNS {
            assert!(crate::storage::migrations::MIGRATION_V1.contains(column));
        }
    }

    #[test]
    fn test_enum_tables() {
        assert_eq!("ring".parse::<ItemType>().unwrap(), ItemType::Ring);
        assert_eq!(ItemType::ALL.len(), 10);
        for item_type in ItemType::ALL {
            assert_eq!(item_type.as_str().parse::<ItemType>().unwrap(), item_type);
        }
        assert_eq!(StatType::parse_field("s", "luck").unwrap(), StatType::Luck);
    }
}
