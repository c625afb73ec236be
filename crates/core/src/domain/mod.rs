pub mod approval;
pub mod commission;
pub mod identity;
pub mod quote;
pub mod store;
