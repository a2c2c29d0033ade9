pub mod batch_csv;
pub mod box_score;
pub mod cli;
pub mod columns;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod http_client;
pub mod pipeline;
pub mod play_by_play;
pub mod reconcile;
pub mod records;
pub mod sanitize;
pub mod schedule;
pub mod situational;
pub mod text;
pub mod urls;
