//! Core library for turning Monster Rancher 3 data dumps and wiki pages into SQL.

pub mod config;
pub mod database;
pub mod error;
pub mod fandom;
pub mod file_utils;
pub mod http;
pub mod models;
pub mod parsers;
pub mod sql;

pub use error::{Mr3Error, Result};
pub use sql::{SqlRow, render_insert, render_json};
