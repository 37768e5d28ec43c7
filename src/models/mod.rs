//! 数据模型

pub mod account;
pub mod auth;
