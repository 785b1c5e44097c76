//! SQL schema for the maturity SQLite store.
//!
//! Executed once per store via the schema `OnceCell`. Every statement is
//! idempotent, so re-running it against an existing file is harmless.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Legacy flat tables ──────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS assessments (
    id                 TEXT PRIMARY KEY,
    screening_answer   TEXT NOT NULL CHECK (screening_answer IN ('yes', 'no')),
    answers            TEXT NOT NULL DEFAULT '{}',   -- question key -> level
    score_overall      INTEGER,
    score_specs        INTEGER,
    score_context      INTEGER,
    score_agents       INTEGER,
    score_feedback     INTEGER,
    score_governance   INTEGER,
    score_delivery     INTEGER,
    score_organization INTEGER,
    archetype_id       TEXT,
    created_at         TEXT NOT NULL,
    user_agent         TEXT,
    referrer           TEXT,
    session_id         TEXT,
    email              TEXT
);

CREATE TABLE IF NOT EXISTS market_research_responses (
    id            TEXT PRIMARY KEY,
    assessment_id TEXT NOT NULL REFERENCES assessments(id) ON DELETE CASCADE,
    question_key  TEXT NOT NULL,
    response      TEXT NOT NULL,                     -- {selected, other, text}
    created_at    TEXT NOT NULL,
    UNIQUE (assessment_id, question_key)
);

-- ── Question lookup tables ──────────────────────────────────────────────────

-- Shared across survey versions; rows are updated in place, never deleted.
CREATE TABLE IF NOT EXISTS question (
    question_id    TEXT PRIMARY KEY,
    question_key   TEXT NOT NULL UNIQUE,
    question_group TEXT NOT NULL
                   CHECK (question_group IN ('screening', 'maturity', 'market-research')),
    question_type  TEXT NOT NULL
                   CHECK (question_type IN ('single-select', 'multi-select', 'open-text')),
    capability_id  TEXT,
    prompt         TEXT NOT NULL,
    allow_other    INTEGER NOT NULL DEFAULT 0,
    is_required    INTEGER NOT NULL DEFAULT 0,
    metadata       TEXT NOT NULL DEFAULT '{}',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Options no longer in the bank keep their row (answers reference them) and
-- carry a non-null retired_at.
CREATE TABLE IF NOT EXISTS question_option (
    option_id      TEXT PRIMARY KEY,
    question_id    TEXT NOT NULL REFERENCES question(question_id),
    option_key     TEXT,
    option_label   TEXT NOT NULL,
    maturity_level INTEGER CHECK (maturity_level BETWEEN 1 AND 5),
    option_order   INTEGER NOT NULL,
    is_other       INTEGER NOT NULL DEFAULT 0,
    retired_at     TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    UNIQUE (question_id, option_key)
);

CREATE UNIQUE INDEX IF NOT EXISTS question_option_current_order_idx
    ON question_option(question_id, option_order)
    WHERE retired_at IS NULL;

-- ── Survey versions ─────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS survey (
    survey_id       TEXT PRIMARY KEY,
    version_number  INTEGER NOT NULL UNIQUE CHECK (version_number >= 1),
    name            TEXT NOT NULL,
    status          TEXT NOT NULL CHECK (status IN ('draft', 'active', 'archived')),
    source          TEXT NOT NULL,
    source_checksum TEXT NOT NULL,
    metadata        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    activated_at    TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS survey_single_active_idx
    ON survey(status)
    WHERE status = 'active';

CREATE TABLE IF NOT EXISTS survey_question_map (
    map_id         TEXT PRIMARY KEY,
    survey_id      TEXT NOT NULL REFERENCES survey(survey_id) ON DELETE CASCADE,
    question_id    TEXT NOT NULL REFERENCES question(question_id),
    section        TEXT NOT NULL
                   CHECK (section IN ('screening', 'maturity', 'market-research')),
    question_order INTEGER NOT NULL,
    is_scored      INTEGER NOT NULL DEFAULT 0,
    is_enabled     INTEGER NOT NULL DEFAULT 1,
    UNIQUE (survey_id, question_id),
    UNIQUE (survey_id, section, question_order)
);

-- ── Submissions ─────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS survey_submission (
    submission_id    TEXT PRIMARY KEY,
    survey_id        TEXT NOT NULL REFERENCES survey(survey_id),
    session_id       TEXT,
    user_agent       TEXT,
    referrer         TEXT,
    respondent_email TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS survey_submission_answer (
    answer_id      TEXT PRIMARY KEY,
    submission_id  TEXT NOT NULL REFERENCES survey_submission(submission_id) ON DELETE CASCADE,
    map_id         TEXT NOT NULL REFERENCES survey_question_map(map_id),
    question_id    TEXT NOT NULL REFERENCES question(question_id),
    option_id      TEXT REFERENCES question_option(option_id),
    answer_kind    TEXT NOT NULL
                   CHECK (answer_kind IN ('selected_option', 'other_text', 'open_text', 'screening')),
    answer_text    TEXT,
    answer_numeric REAL,
    answer_index   INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS survey_submission_answer_slot_idx
    ON survey_submission_answer(
        submission_id, question_id, answer_kind, COALESCE(option_id, ''), answer_index
    );

CREATE TABLE IF NOT EXISTS survey_submission_score (
    score_id      TEXT PRIMARY KEY,
    submission_id TEXT NOT NULL REFERENCES survey_submission(submission_id) ON DELETE CASCADE,
    score_scope   TEXT NOT NULL CHECK (score_scope IN ('overall', 'capability', 'question')),
    scope_key     TEXT NOT NULL,
    score_value   REAL NOT NULL,
    created_at    TEXT NOT NULL,
    UNIQUE (submission_id, score_scope, scope_key)
);

CREATE INDEX IF NOT EXISTS survey_question_map_survey_idx ON survey_question_map(survey_id);
CREATE INDEX IF NOT EXISTS survey_submission_survey_idx   ON survey_submission(survey_id);
CREATE INDEX IF NOT EXISTS submission_answer_question_idx
    ON survey_submission_answer(submission_id, question_id);

PRAGMA user_version = 1;
";
