pub mod auth;
pub mod campaigns;
pub mod clients;
pub mod contacts;
pub mod documents;
pub mod error;
pub mod groups;
pub mod messages;
pub mod state;
pub mod templates;
pub mod webhook;
