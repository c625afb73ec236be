pub mod bootstrap;
pub mod commission;
pub mod numbering;
pub mod policy;
pub mod pricing;
pub mod source;
pub mod visibility;

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::approval::ApprovalOutcome;
use crate::domain::commission::{CommissionRole, TierTable};
use crate::domain::quote::{validate_discount_fraction, PricingResult, QuotePricingInput};
use crate::domain::store::{StoreConfig, StoreId};
use crate::errors::{ApplicationError, DomainError};

use self::{
    commission::{CommissionEngine, ProgressiveCommissionEngine},
    policy::{DiscountPolicy, ThresholdDiscountPolicy},
    pricing::aggregate_costs,
    source::PricingConfigSource,
};

/// Prices quotes against per-store configuration.
///
/// The pricer holds no mutable state. The only write a call can trigger is
/// the store config bootstrap inside the [`PricingConfigSource`].
pub struct QuotePricer<S, C = ProgressiveCommissionEngine, D = ThresholdDiscountPolicy> {
    source: S,
    commission_engine: C,
    discount_policy: D,
    audit_sink: Option<Arc<dyn AuditSink>>,
}

impl<S> QuotePricer<S> {
    pub fn new(source: S) -> Self {
        Self::with_engines(source, ProgressiveCommissionEngine, ThresholdDiscountPolicy)
    }
}

impl<S, C, D> QuotePricer<S, C, D> {
    pub fn with_engines(source: S, commission_engine: C, discount_policy: D) -> Self {
        Self { source, commission_engine, discount_policy, audit_sink: None }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit_sink {
            sink.emit(event);
        }
    }
}

impl<S, C, D> QuotePricer<S, C, D>
where
    S: PricingConfigSource,
    C: CommissionEngine,
    D: DiscountPolicy,
{
    pub async fn price_quote(
        &self,
        input: &QuotePricingInput,
    ) -> Result<PricingResult, ApplicationError> {
        self.price_quote_with_correlation(input, Uuid::new_v4().to_string()).await
    }

    pub async fn price_quote_with_correlation(
        &self,
        input: &QuotePricingInput,
        correlation_id: impl Into<String>,
    ) -> Result<PricingResult, ApplicationError> {
        let correlation_id = correlation_id.into();

        if let Err(error) = input.validate() {
            return Err(self.reject(input, correlation_id, error));
        }

        let config = self.source.get_or_create_store_config(&input.store_id).await?;
        let seller_tiers = self.load_tiers(&input.store_id, CommissionRole::Seller).await?;
        let manager_tiers = self.load_tiers(&input.store_id, CommissionRole::Manager).await?;

        let approval = self.evaluate(&config, input.discount_fraction);
        let aggregation = match aggregate_costs(
            input,
            &config,
            &seller_tiers,
            &manager_tiers,
            &self.commission_engine,
        ) {
            Ok(aggregation) => aggregation,
            Err(error) => return Err(self.reject(input, correlation_id, error)),
        };
        let result = PricingResult::assemble(aggregation, approval, config);

        info!(
            event_name = "pricing.quote.priced",
            correlation_id = %correlation_id,
            store_id = %input.store_id,
            final_value = %result.final_value,
            margin = %result.margin,
            required_level = result.approval.required_level.as_str(),
            "quote priced"
        );
        self.emit(
            AuditEvent::new(
                Some(input.store_id.clone()),
                correlation_id,
                "pricing.quote_priced",
                AuditCategory::Pricing,
                input.seller_id.0.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("final_value", result.final_value.to_string())
            .with_metadata("discount_fraction", result.discount_fraction.to_string())
            .with_metadata("required_level", result.approval.required_level.as_str()),
        );

        Ok(result)
    }

    /// Approval outcome for a discount without running the cost pipeline.
    pub async fn preview_discount(
        &self,
        store_id: &StoreId,
        discount_fraction: Decimal,
    ) -> Result<ApprovalOutcome, ApplicationError> {
        if store_id.0.trim().is_empty() {
            return Err(DomainError::invalid_input("store_id", "must not be empty").into());
        }
        validate_discount_fraction(discount_fraction)?;

        let config = self.source.get_or_create_store_config(store_id).await?;
        Ok(self.evaluate(&config, discount_fraction))
    }

    fn reject(
        &self,
        input: &QuotePricingInput,
        correlation_id: String,
        error: DomainError,
    ) -> ApplicationError {
        warn!(
            event_name = "pricing.quote.rejected",
            correlation_id = %correlation_id,
            store_id = %input.store_id,
            error = %error,
            "quote pricing input rejected"
        );
        self.emit(
            AuditEvent::new(
                Some(input.store_id.clone()),
                correlation_id,
                "pricing.quote_rejected",
                AuditCategory::Pricing,
                input.seller_id.0.clone(),
                AuditOutcome::Rejected,
            )
            .with_metadata("reason", error.to_string()),
        );
        error.into()
    }

    fn evaluate(&self, config: &StoreConfig, discount_fraction: Decimal) -> ApprovalOutcome {
        self.discount_policy.evaluate(
            discount_fraction,
            config.seller_discount_limit,
            config.manager_discount_limit,
        )
    }

    async fn load_tiers(
        &self,
        store_id: &StoreId,
        role: CommissionRole,
    ) -> Result<TierTable, ApplicationError> {
        let tiers = self.source.get_commission_tiers(store_id, role).await?;
        Ok(TierTable::new(tiers)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::QuotePricer;
    use crate::audit::{AuditOutcome, InMemoryAuditSink};
    use crate::cpq::source::PricingConfigSource;
    use crate::domain::approval::ApprovalLevel;
    use crate::domain::commission::{CommissionRole, CommissionTier};
    use crate::domain::quote::{QuotePricingInput, SellerId};
    use crate::domain::store::{StoreConfig, StoreDefaults, StoreId};
    use crate::errors::{ApplicationError, DomainError};

    #[derive(Default)]
    struct FakeSource {
        configs: Mutex<HashMap<StoreId, StoreConfig>>,
        tiers: HashMap<CommissionRole, Vec<CommissionTier>>,
        config_reads: AtomicUsize,
    }

    impl FakeSource {
        fn with_reference_tiers() -> Self {
            let mut tiers = HashMap::new();
            tiers.insert(
                CommissionRole::Seller,
                vec![
                    CommissionTier {
                        order: 1,
                        min_value: Decimal::ZERO,
                        max_value: Some(Decimal::from(25_000)),
                        rate: Decimal::new(5, 2),
                    },
                    CommissionTier {
                        order: 2,
                        min_value: Decimal::from(25_000),
                        max_value: Some(Decimal::from(50_000)),
                        rate: Decimal::new(6, 2),
                    },
                    CommissionTier {
                        order: 3,
                        min_value: Decimal::from(50_000),
                        max_value: None,
                        rate: Decimal::new(8, 2),
                    },
                ],
            );
            Self { tiers, ..Self::default() }
        }

        fn stored(&self, store_id: &StoreId) -> Option<StoreConfig> {
            self.configs.lock().expect("lock").get(store_id).cloned()
        }
    }

    #[async_trait]
    impl PricingConfigSource for FakeSource {
        async fn get_or_create_store_config(
            &self,
            store_id: &StoreId,
        ) -> Result<StoreConfig, ApplicationError> {
            self.config_reads.fetch_add(1, Ordering::SeqCst);
            let mut configs = self.configs.lock().expect("lock");
            Ok(configs
                .entry(store_id.clone())
                .or_insert_with(|| {
                    StoreConfig::from_defaults(store_id.clone(), &StoreDefaults::default())
                })
                .clone())
        }

        async fn get_commission_tiers(
            &self,
            _store_id: &StoreId,
            role: CommissionRole,
        ) -> Result<Vec<CommissionTier>, ApplicationError> {
            Ok(self.tiers.get(&role).cloned().unwrap_or_default())
        }
    }

    fn input(discount: Decimal) -> QuotePricingInput {
        let mut input = QuotePricingInput::new(
            StoreId("store-1".into()),
            SellerId("seller-1".into()),
            Decimal::from(50_000),
        );
        input.discount_fraction = discount;
        input
    }

    #[tokio::test]
    async fn prices_quote_with_bootstrapped_defaults() {
        let pricer = QuotePricer::new(FakeSource::with_reference_tiers());
        let result = pricer.price_quote(&input(Decimal::new(20, 2))).await.expect("price");

        assert_eq!(result.final_value, Decimal::from(40_000));
        assert_eq!(result.costs.factory_cost, Decimal::from(20_000));
        assert_eq!(result.costs.seller_commission, Decimal::from(2_150));
        assert_eq!(result.costs.manager_commission, Decimal::ZERO);
        assert_eq!(result.approval.required_level, ApprovalLevel::Manager);
        assert_eq!(result.config_snapshot.store_id, StoreId("store-1".into()));
        assert!(pricer.source().stored(&StoreId("store-1".into())).is_some());
    }

    #[tokio::test]
    async fn pricing_is_idempotent_and_leaves_config_untouched() {
        let pricer = QuotePricer::new(FakeSource::with_reference_tiers());
        let request = input(Decimal::new(10, 2));

        let first = pricer.price_quote(&request).await.expect("first");
        let stored_after_first = pricer.source().stored(&request.store_id);
        let second = pricer.price_quote(&request).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(pricer.source().stored(&request.store_id), stored_after_first);
        assert_eq!(first.config_snapshot.next_number, 1);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_config_read() {
        let sink = InMemoryAuditSink::default();
        let pricer = QuotePricer::new(FakeSource::with_reference_tiers())
            .with_audit_sink(Arc::new(sink.clone()));

        let error = pricer.price_quote(&input(Decimal::ONE)).await.expect_err("discount of 1");

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::InvalidInput { ref field, .. })
                if field == "discount_fraction"
        ));
        assert_eq!(pricer.source().config_reads.load(Ordering::SeqCst), 0);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "pricing.quote_rejected");
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
    }

    #[tokio::test]
    async fn priced_quote_emits_audit_event_with_correlation_id() {
        let sink = InMemoryAuditSink::default();
        let pricer = QuotePricer::new(FakeSource::with_reference_tiers())
            .with_audit_sink(Arc::new(sink.clone()));

        pricer
            .price_quote_with_correlation(&input(Decimal::new(30, 2)), "req-42")
            .await
            .expect("price");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "pricing.quote_priced");
        assert_eq!(events[0].correlation_id, "req-42");
        assert_eq!(events[0].metadata.get("required_level").map(String::as_str), Some("ADMIN"));
    }

    #[tokio::test]
    async fn malformed_tier_table_is_rejected() {
        let mut source = FakeSource::default();
        let tier = CommissionTier {
            order: 1,
            min_value: Decimal::ZERO,
            max_value: None,
            rate: Decimal::new(5, 2),
        };
        source.tiers.insert(CommissionRole::Manager, vec![tier.clone(), tier]);

        let error = QuotePricer::new(source)
            .price_quote(&input(Decimal::ZERO))
            .await
            .expect_err("duplicate order");

        assert_eq!(error.error_class(), "invalid_tier_table");
    }

    #[tokio::test]
    async fn preview_discount_reports_required_level_only() {
        let pricer = QuotePricer::new(FakeSource::default());
        let store_id = StoreId("store-1".into());

        let within =
            pricer.preview_discount(&store_id, Decimal::new(15, 2)).await.expect("preview");
        let escalated =
            pricer.preview_discount(&store_id, Decimal::new(26, 2)).await.expect("preview");

        assert!(within.auto_approved);
        assert_eq!(escalated.required_level, ApprovalLevel::Admin);
        assert!(pricer.preview_discount(&store_id, Decimal::new(-1, 2)).await.is_err());
    }

    #[tokio::test]
    async fn unrepresentable_margin_is_rejected_without_panicking() {
        let sink = InMemoryAuditSink::default();
        let pricer =
            QuotePricer::new(FakeSource::default()).with_audit_sink(Arc::new(sink.clone()));
        let mut request = input(Decimal::ZERO);
        request.base_value = Decimal::new(1, 28);

        let error = pricer.price_quote(&request).await.expect_err("margin percent overflows");

        assert_eq!(error, ApplicationError::Domain(DomainError::out_of_range("margin_percent")));
        assert_eq!(error.error_class(), "invalid_input");
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Rejected);
    }
}
