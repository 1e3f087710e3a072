// This file contains all SQL statements issued by verse_server.
#![forbid(unsafe_code)]

// ========================= table creation ========================
// Issued only when --initdb is given.  Both statements are idempotent.
pub const CREATE_AUTHORS_TABLE: &str = concat!(
    "CREATE TABLE IF NOT EXISTS authors (",
    "id SERIAL PRIMARY KEY, ",
    "name TEXT NOT NULL UNIQUE, ",
    "description TEXT NOT NULL DEFAULT '', ",
    "created TEXT NOT NULL, ",
    "updated TEXT NOT NULL)",
);

pub const CREATE_POEMS_TABLE: &str = concat!(
    "CREATE TABLE IF NOT EXISTS poems (",
    "id SERIAL PRIMARY KEY, ",
    "title TEXT NOT NULL, ",
    "content TEXT NOT NULL DEFAULT '', ",
    "author_id INTEGER NOT NULL REFERENCES authors (id), ",
    "created TEXT NOT NULL, ",
    "updated TEXT NOT NULL)",
);

// ========================= authors table =========================
pub const INSERT_AUTHOR: &str = concat!(
    "INSERT INTO authors (name, description, created, updated) ",
    "VALUES ($1, $2, $3, $4) RETURNING id",
);

pub const GET_AUTHOR: &str = concat!(
    "SELECT id, name, description, created, updated ",
    "FROM authors WHERE id = $1",
);

pub const LIST_AUTHORS: &str = concat!(
    "SELECT id, name, description, created, updated ",
    "FROM authors ORDER BY id",
);

pub const UPDATE_AUTHOR: &str = concat!(
    "UPDATE authors SET name = $1, description = $2, updated = $3 ",
    "WHERE id = $4",
);

pub const DELETE_AUTHOR: &str = concat!(
    "DELETE FROM authors WHERE id = $1",
);

// Existence probe used before inserting or repointing a poem.
pub const GET_AUTHOR_ID: &str = concat!(
    "SELECT id FROM authors WHERE id = $1",
);

// ========================== poems table ==========================
pub const INSERT_POEM: &str = concat!(
    "INSERT INTO poems (title, content, author_id, created, updated) ",
    "VALUES ($1, $2, $3, $4, $5) RETURNING id",
);

pub const GET_POEM: &str = concat!(
    "SELECT id, title, content, author_id, created, updated ",
    "FROM poems WHERE id = $1",
);

pub const LIST_POEMS: &str = concat!(
    "SELECT id, title, content, author_id, created, updated ",
    "FROM poems ORDER BY id",
);

pub const LIST_POEMS_BY_AUTHOR: &str = concat!(
    "SELECT id, title, content, author_id, created, updated ",
    "FROM poems WHERE author_id = $1 ORDER BY id",
);

pub const UPDATE_POEM: &str = concat!(
    "UPDATE poems SET title = $1, content = $2, author_id = $3, updated = $4 ",
    "WHERE id = $5",
);

pub const DELETE_POEM: &str = concat!(
    "DELETE FROM poems WHERE id = $1",
);
