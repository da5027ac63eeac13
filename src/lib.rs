pub mod config;
pub mod humanize;
pub mod message;
pub mod observability;
pub mod queue;
pub mod storage;
pub mod upscale;
pub mod worker;
