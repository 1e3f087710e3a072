#![forbid(unsafe_code)]

pub mod verse;
