pub mod balance;
pub mod credential;
pub mod job_event;
pub mod purchase;
