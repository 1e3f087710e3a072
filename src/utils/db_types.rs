// This file contains the verse_server database structs and related definitions.
#![forbid(unsafe_code)]

use serde::Deserialize;

// ---------------------------------------------------------------------------
// authors:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorInput {
    pub name: String,
    pub description: String,
    pub created: String,
    pub updated: String,
}

// ---------------------------------------------------------------------------
// poems:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Poem {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Deserialize)]
pub struct PoemInput {
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub created: String,
    pub updated: String,
}

impl Author {
    pub fn new(id: i32, name: String, description: String, created: String, updated: String) -> Author {
        Author { id, name, description, created, updated }
    }
}

impl AuthorInput {
    pub fn new(name: String, description: String, created: String, updated: String) -> AuthorInput {
        AuthorInput { name, description, created, updated }
    }
}

impl Poem {
    pub fn new(id: i32, title: String, content: String, author_id: i32,
               created: String, updated: String) -> Poem {
        Poem { id, title, content, author_id, created, updated }
    }
}

impl PoemInput {
    pub fn new(title: String, content: String, author_id: i32,
               created: String, updated: String) -> PoemInput {
        PoemInput { title, content, author_id, created, updated }
    }
}
