// Civility: comment moderation and visibility engine for social feeds.
//
// This is the library root. Modules run leaf to root: text normalization,
// rule categorization, the toxicity classifier, score fusion, and the
// moderation engine that stores comments and renders them per viewer.

pub mod config;
pub mod db;
pub mod moderation;
pub mod output;
pub mod rules;
pub mod scoring;
pub mod status;
pub mod text;
pub mod toxicity;
