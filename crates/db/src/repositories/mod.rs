pub mod balance_repo;
pub mod credential_repo;
pub mod job_event_repo;
pub mod purchase_repo;

pub use balance_repo::BalanceRepo;
pub use credential_repo::CredentialRepo;
pub use job_event_repo::JobEventRepo;
pub use purchase_repo::PurchaseRepo;
