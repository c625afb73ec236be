pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use cpq::bootstrap::ConfigBootstrap;
pub use cpq::commission::{calculate_progressive_commission, CommissionEngine};
pub use cpq::numbering::format_quote_number;
pub use cpq::policy::{evaluate_discount, request_discount_approval, DiscountPolicy};
pub use cpq::pricing::aggregate_costs;
pub use cpq::source::{PricingConfigSource, StoreConfigStore};
pub use cpq::visibility::{can_access_quote, project_for_role, PricingView};
pub use cpq::QuotePricer;
pub use domain::approval::{ApprovalLevel, ApprovalOutcome, DiscountApprovalRequest};
pub use domain::commission::{CommissionResult, CommissionRole, CommissionTier, TierTable};
pub use domain::identity::{CallerIdentity, CallerRole};
pub use domain::quote::{AdditionalCost, PricingResult, QuotePricingInput, SellerId};
pub use domain::store::{NumberingFormat, StoreConfig, StoreDefaults, StoreId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
