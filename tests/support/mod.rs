#![allow(dead_code)]

pub mod executor;
pub mod fixtures;
