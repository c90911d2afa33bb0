//! Database Migrations - PostgreSQL schema for the authoring backend
//!
//! `game` holds live content, `tooling` the pending copies edited by the tool,
//! `management` operator records. Every statement is idempotent so the
//! migration can be applied against a database the game already populated.

/// Schemas, live content tables and their pending counterparts.
pub const MIGRATION_V1: &str = r#"
-- ============================================================================
-- Tower Tooling Schema v1
-- ============================================================================

CREATE SCHEMA IF NOT EXISTS game;
CREATE SCHEMA IF NOT EXISTS tooling;
CREATE SCHEMA IF NOT EXISTS management;

-- ============================================================================
-- 1. Effect catalogue (read-only to the tool)
-- ============================================================================

CREATE TABLE IF NOT EXISTS game.effects (
    id              SERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT
);

-- ============================================================================
-- 2. Live content
-- ============================================================================

CREATE TABLE IF NOT EXISTS game.items (
    id              SERIAL PRIMARY KEY,
    version         INTEGER NOT NULL DEFAULT 1,
    name            TEXT NOT NULL,
    item_type       TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    silver          INTEGER NOT NULL DEFAULT 0,
    socket          BOOLEAN NOT NULL DEFAULT FALSE,
    stats           JSONB NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS game.perks (
    id              SERIAL PRIMARY KEY,
    version         INTEGER NOT NULL DEFAULT 1,
    name            TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    effect_id       INTEGER,
    stats           JSONB NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS game.enemies (
    id              SERIAL PRIMARY KEY,
    version         INTEGER NOT NULL DEFAULT 1,
    name            TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    level           INTEGER NOT NULL DEFAULT 1,
    health          INTEGER NOT NULL DEFAULT 1,
    strength        INTEGER NOT NULL DEFAULT 0,
    stamina         INTEGER NOT NULL DEFAULT 0,
    agility         INTEGER NOT NULL DEFAULT 0,
    luck            INTEGER NOT NULL DEFAULT 0,
    armor           INTEGER NOT NULL DEFAULT 0,
    effect_id       INTEGER
);

CREATE TABLE IF NOT EXISTS game.talents (
    id                  SERIAL PRIMARY KEY,
    version             INTEGER NOT NULL DEFAULT 1,
    name                TEXT NOT NULL,
    description         TEXT,
    asset_id            INTEGER,
    perk_id             INTEGER,
    required_talent_id  INTEGER,
    stat                TEXT,
    value               INTEGER NOT NULL DEFAULT 0,
    tier                INTEGER NOT NULL DEFAULT 1
);

-- ============================================================================
-- 3. Pending content (authoring copies)
-- ============================================================================

CREATE TABLE IF NOT EXISTS tooling.items (
    tooling_id      SERIAL PRIMARY KEY,
    game_id         INTEGER,
    action          TEXT NOT NULL CHECK (action IN ('insert', 'update')),
    version         INTEGER NOT NULL DEFAULT 0,
    approved        BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    name            TEXT NOT NULL,
    item_type       TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    silver          INTEGER NOT NULL DEFAULT 0,
    socket          BOOLEAN NOT NULL DEFAULT FALSE,
    stats           JSONB NOT NULL DEFAULT '[]',
    CHECK ((action = 'insert') = (game_id IS NULL))
);

CREATE TABLE IF NOT EXISTS tooling.perks (
    tooling_id      SERIAL PRIMARY KEY,
    game_id         INTEGER,
    action          TEXT NOT NULL CHECK (action IN ('insert', 'update')),
    version         INTEGER NOT NULL DEFAULT 0,
    approved        BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    name            TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    effect_id       INTEGER,
    stats           JSONB NOT NULL DEFAULT '[]',
    CHECK ((action = 'insert') = (game_id IS NULL))
);

CREATE TABLE IF NOT EXISTS tooling.enemies (
    tooling_id      SERIAL PRIMARY KEY,
    game_id         INTEGER,
    action          TEXT NOT NULL CHECK (action IN ('insert', 'update')),
    version         INTEGER NOT NULL DEFAULT 0,
    approved        BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    name            TEXT NOT NULL,
    description     TEXT,
    asset_id        INTEGER,
    level           INTEGER NOT NULL DEFAULT 1,
    health          INTEGER NOT NULL DEFAULT 1,
    strength        INTEGER NOT NULL DEFAULT 0,
    stamina         INTEGER NOT NULL DEFAULT 0,
    agility         INTEGER NOT NULL DEFAULT 0,
    luck            INTEGER NOT NULL DEFAULT 0,
    armor           INTEGER NOT NULL DEFAULT 0,
    effect_id       INTEGER,
    CHECK ((action = 'insert') = (game_id IS NULL))
);

CREATE TABLE IF NOT EXISTS tooling.talents (
    tooling_id          SERIAL PRIMARY KEY,
    game_id             INTEGER,
    action              TEXT NOT NULL CHECK (action IN ('insert', 'update')),
    version             INTEGER NOT NULL DEFAULT 0,
    approved            BOOLEAN NOT NULL DEFAULT FALSE,
    created_at          TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    name                TEXT NOT NULL,
    description         TEXT,
    asset_id            INTEGER,
    perk_id             INTEGER,
    required_talent_id  INTEGER,
    stat                TEXT,
    value               INTEGER NOT NULL DEFAULT 0,
    tier                INTEGER NOT NULL DEFAULT 1,
    CHECK ((action = 'insert') = (game_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_tooling_items_approved ON tooling.items(approved);
CREATE INDEX IF NOT EXISTS idx_tooling_perks_approved ON tooling.perks(approved);
CREATE INDEX IF NOT EXISTS idx_tooling_enemies_approved ON tooling.enemies(approved);
CREATE INDEX IF NOT EXISTS idx_tooling_talents_approved ON tooling.talents(approved);

-- ============================================================================
-- 4. Expedition graphs
-- ============================================================================

CREATE TABLE IF NOT EXISTS game.expeditions (
    id              SERIAL PRIMARY KEY,
    name            TEXT NOT NULL DEFAULT '',
    description     TEXT,
    asset_id        INTEGER
);

CREATE TABLE IF NOT EXISTS game.expedition_slides (
    id              SERIAL PRIMARY KEY,
    expedition_id   INTEGER NOT NULL REFERENCES game.expeditions(id) ON DELETE CASCADE,
    text            TEXT NOT NULL DEFAULT '',
    asset_id        INTEGER,
    effect_id       INTEGER,
    effect_value    INTEGER,
    is_start        BOOLEAN NOT NULL DEFAULT FALSE,
    reward_silver   INTEGER,
    reward_item_id  INTEGER,
    pos_x           DOUBLE PRECISION NOT NULL DEFAULT 0,
    pos_y           DOUBLE PRECISION NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS game.expedition_options (
    id              SERIAL PRIMARY KEY,
    slide_id        INTEGER NOT NULL REFERENCES game.expedition_slides(id) ON DELETE CASCADE,
    sort_order      INTEGER NOT NULL DEFAULT 0,
    text            TEXT NOT NULL DEFAULT '',
    stat_type       TEXT,
    stat_required   INTEGER,
    effect_id       INTEGER,
    effect_value    INTEGER,
    enemy_id        INTEGER
);

CREATE TABLE IF NOT EXISTS game.expedition_outcomes (
    id              SERIAL PRIMARY KEY,
    option_id       INTEGER NOT NULL REFERENCES game.expedition_options(id) ON DELETE CASCADE,
    target_slide_id INTEGER NOT NULL REFERENCES game.expedition_slides(id) ON DELETE CASCADE,
    weight          INTEGER NOT NULL DEFAULT 1 CHECK (weight >= 1)
);

CREATE INDEX IF NOT EXISTS idx_expedition_slides_expedition ON game.expedition_slides(expedition_id);
CREATE INDEX IF NOT EXISTS idx_expedition_options_slide ON game.expedition_options(slide_id);
CREATE INDEX IF NOT EXISTS idx_expedition_outcomes_option ON game.expedition_outcomes(option_id);

-- ============================================================================
-- 5. Quest graphs
-- ============================================================================

CREATE TABLE IF NOT EXISTS game.quest_chains (
    id              SERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT,
    settlement_id   INTEGER,
    asset_id        INTEGER
);

CREATE TABLE IF NOT EXISTS game.quests (
    id                  SERIAL PRIMARY KEY,
    chain_id            INTEGER NOT NULL REFERENCES game.quest_chains(id) ON DELETE CASCADE,
    title               TEXT NOT NULL DEFAULT '',
    description         TEXT,
    asset_id            INTEGER,
    pos_x               DOUBLE PRECISION NOT NULL DEFAULT 0,
    pos_y               DOUBLE PRECISION NOT NULL DEFAULT 0,
    requisite_option_id INTEGER
);

CREATE TABLE IF NOT EXISTS game.quest_options (
    id              SERIAL PRIMARY KEY,
    quest_id        INTEGER NOT NULL REFERENCES game.quests(id) ON DELETE CASCADE,
    text            TEXT NOT NULL DEFAULT '',
    pos_x           DOUBLE PRECISION NOT NULL DEFAULT 0,
    pos_y           DOUBLE PRECISION NOT NULL DEFAULT 0,
    reward_silver   INTEGER,
    reward_item_id  INTEGER,
    ends_quest      BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS game.quest_option_requirements (
    option_id           INTEGER NOT NULL REFERENCES game.quest_options(id) ON DELETE CASCADE,
    required_option_id  INTEGER NOT NULL REFERENCES game.quest_options(id) ON DELETE CASCADE,
    PRIMARY KEY (option_id, required_option_id)
);

CREATE INDEX IF NOT EXISTS idx_quests_chain ON game.quests(chain_id);
CREATE INDEX IF NOT EXISTS idx_quest_options_quest ON game.quest_options(quest_id);

-- ============================================================================
-- 6. Settlements, NPCs, characters
-- ============================================================================

CREATE TABLE IF NOT EXISTS game.settlements (
    id                      SERIAL PRIMARY KEY,
    name                    TEXT NOT NULL,
    description             TEXT,
    asset_id                INTEGER,
    blacksmith              BOOLEAN NOT NULL DEFAULT FALSE,
    alchemist               BOOLEAN NOT NULL DEFAULT FALSE,
    enchanter               BOOLEAN NOT NULL DEFAULT FALSE,
    trainer                 BOOLEAN NOT NULL DEFAULT FALSE,
    church                  BOOLEAN NOT NULL DEFAULT FALSE,
    blacksmith_asset_id     INTEGER,
    alchemist_asset_id      INTEGER,
    enchanter_asset_id      INTEGER,
    trainer_asset_id        INTEGER,
    church_asset_id         INTEGER,
    blessing_1              INTEGER,
    blessing_2              INTEGER,
    blessing_3              INTEGER
);

CREATE TABLE IF NOT EXISTS game.npcs (
    id              SERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    context         TEXT,
    role            TEXT,
    personality     TEXT[] NOT NULL DEFAULT '{}',
    goals           TEXT[] NOT NULL DEFAULT '{}',
    settlement_id   INTEGER
);

-- Written by the game servers; read here for instance statistics.
CREATE TABLE IF NOT EXISTS game.characters (
    id              SERIAL PRIMARY KEY,
    player_id       TEXT NOT NULL,
    server_id       INTEGER NOT NULL,
    name            TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_characters_server ON game.characters(server_id);

-- ============================================================================
-- 7. Management
-- ============================================================================

CREATE TABLE IF NOT EXISTS management.banned_words (
    id              SERIAL PRIMARY KEY,
    word            TEXT NOT NULL UNIQUE,
    severity        INTEGER NOT NULL DEFAULT 1 CHECK (severity >= 1)
);

CREATE TABLE IF NOT EXISTS management.servers (
    id              SERIAL PRIMARY KEY,
    name            TEXT,
    created_at      TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    ends_at         TIMESTAMP WITH TIME ZONE NOT NULL
);
"#;

/// Get all migration SQL statements in order
pub fn get_migrations() -> Vec<(&'static str, &'static str)> {
    vec![("v1_tooling_schema", MIGRATION_V1)]
}
