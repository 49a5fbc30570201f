pub mod catalog;
pub mod comment;
pub mod episode;
pub mod fixtures;
pub mod library;
pub mod release;
pub mod support;
pub mod tasks;
pub mod token;
pub mod user;
pub mod voiceover;
