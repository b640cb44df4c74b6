pub mod balance;
pub mod credentials;
pub mod generate;
pub mod jobs;
pub mod webhooks;
