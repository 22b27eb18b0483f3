pub mod auth;
pub mod candidates;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod interviews;
pub mod jobs;
pub mod messages;
pub mod metrics;
pub mod swagger;
pub mod users;
