#![forbid(unsafe_code)]

pub mod authors_create;
pub mod authors_delete;
pub mod authors_get;
pub mod authors_list;
pub mod authors_update;
pub mod poems_create;
pub mod poems_delete;
pub mod poems_get;
pub mod poems_list;
pub mod poems_update;
pub mod version;
