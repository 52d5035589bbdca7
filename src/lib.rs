//! GenAI audit trail: libSQL persistence for conversations, messages and
//! the feedback they collect.

pub mod audit;
pub mod config;
pub mod dto;
pub mod entities;
pub mod error;
pub mod mapping;
pub mod services;
pub mod store;
