//! Multi-step checkout sequencer.
//!
//! Checkout walks four ordered steps - shipping info, shipping method,
//! payment method, confirmation - accumulating a draft that is validated
//! per step, persisted after every successful submission, and restored
//! across reloads. Confirmation assembles the order payload and submits
//! it through an [`OrderGateway`]; only a successful backend
//! acknowledgment clears the draft and the cart.
//!
//! Transitions are strictly one step forward (by submitting the current
//! step's section) or one step back; there is no skipping. The
//! empty-cart entry guard lives at the route layer, because "redirect
//! away from checkout" is a navigation concern, not a machine state.

pub mod order;
pub mod validation;

pub use validation::{FieldError, ShippingInfo, ValidationReport, validate_shipping_info};

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use linen_core::Price;

use crate::api::{ApiError, OrderGateway};
use crate::cart::CartStore;
use crate::models::session::CurrentUser;
use crate::storage::{self, KeyValueStorage, keys};

use order::{OrderConfirmation, OrderPayload};

// =============================================================================
// Steps and fixed enumerations
// =============================================================================

/// The four checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    ShippingInfo,
    ShippingMethod,
    PaymentMethod,
    Confirmation,
}

impl CheckoutStep {
    /// Zero-based position in the sequence.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::ShippingInfo => 0,
            Self::ShippingMethod => 1,
            Self::PaymentMethod => 2,
            Self::Confirmation => 3,
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::ShippingInfo => Self::ShippingMethod,
            Self::ShippingMethod => Self::PaymentMethod,
            Self::PaymentMethod | Self::Confirmation => Self::Confirmation,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::ShippingInfo | Self::ShippingMethod => Self::ShippingInfo,
            Self::PaymentMethod => Self::ShippingMethod,
            Self::Confirmation => Self::PaymentMethod,
        }
    }
}

/// Shipping methods offered at step two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl ShippingMethod {
    /// Every offered method, in display order.
    pub const ALL: [Self; 2] = [Self::Standard, Self::Express];

    /// Wire identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard delivery (3-5 days)",
            Self::Express => "Express delivery (1-2 days)",
        }
    }

    /// Flat shipping cost for this method.
    #[must_use]
    pub fn price(self) -> Price {
        match self {
            Self::Standard => Price::from(30_000),
            Self::Express => Price::from(45_000),
        }
    }

    /// Look up a method by its wire identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.id() == id)
    }
}

/// Payment methods offered at step three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
}

impl PaymentMethod {
    /// Every offered method, in display order.
    pub const ALL: [Self; 2] = [Self::CashOnDelivery, Self::BankTransfer];

    /// Wire identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::BankTransfer => "bank_transfer",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::BankTransfer => "Bank transfer",
        }
    }

    /// Look up a method by its wire identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.id() == id)
    }
}

// =============================================================================
// Draft
// =============================================================================

/// The accumulating checkout draft, persisted after every successful
/// step submission and erased only on a successful order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub step: CheckoutStep,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from the checkout sequencer.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The submitted section failed its step validation.
    #[error("validation failed for {} field(s)", .0.errors.len())]
    Validation(ValidationReport),

    /// No shipping method was selected.
    #[error("no shipping method selected")]
    MissingShippingMethod,

    /// No payment method was selected.
    #[error("no payment method selected")]
    MissingPaymentMethod,

    /// The draft lost its shipping section (storage wiped mid-checkout).
    #[error("shipping information is missing")]
    MissingShippingInfo,

    /// The requested action does not belong to the current step.
    #[error("action not valid on the {current:?} step")]
    WrongStep { current: CheckoutStep },

    /// Order submission requires a signed-in customer.
    #[error("sign in to place an order")]
    NotAuthenticated,

    /// An order submission is already in flight for this session.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The backend rejected or failed the order creation.
    #[error("order submission failed: {0}")]
    Submission(#[from] ApiError),
}

// =============================================================================
// Submission guard
// =============================================================================

/// Per-session in-flight guard for order submission.
///
/// Prevents duplicate order creation while a submission is pending: the
/// submit handler calls [`begin`](Self::begin) before dispatching and
/// holds the returned permit across the call. This is a flag, not a
/// queue; a rejected attempt simply tells the customer a submission is
/// already running.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    active: Mutex<HashSet<String>>,
}

/// Held while an order submission is in flight for one session.
///
/// The scope is released on drop. Handler futures can be dropped at any
/// await point when the client disconnects, so release must not depend
/// on code after the submission running.
#[must_use]
pub struct SubmissionPermit<'a> {
    guard: &'a SubmissionGuard,
    scope: String,
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        self.guard
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.scope);
    }
}

impl SubmissionGuard {
    /// Create an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a submission as in flight.
    ///
    /// Returns `None` when one already is. The scope stays marked until
    /// the permit drops, however the request ends.
    pub fn begin(&self, scope: &str) -> Option<SubmissionPermit<'_>> {
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope.to_owned());

        inserted.then(|| SubmissionPermit {
            guard: self,
            scope: scope.to_owned(),
        })
    }
}

// =============================================================================
// Sequencer
// =============================================================================

/// The checkout state machine, bound to a storage handle.
pub struct CheckoutSequencer<S> {
    storage: S,
    draft: CheckoutDraft,
}

impl<S: KeyValueStorage> CheckoutSequencer<S> {
    /// Restore the draft from storage, or start fresh at step one.
    pub async fn load(storage: S) -> Self {
        let draft = storage::load_or_default(&storage, keys::CHECKOUT_DRAFT).await;
        Self { storage, draft }
    }

    /// The step the customer is currently on.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.draft.step
    }

    /// The accumulated draft.
    #[must_use]
    pub const fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    /// Submit the shipping-info section and advance to step two.
    ///
    /// Validation runs against the incoming section, not the draft, so
    /// merge and advance commit together; a failed section changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off step one,
    /// [`CheckoutError::Validation`] when required fields are missing.
    pub async fn submit_shipping_info(
        &mut self,
        info: ShippingInfo,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::ShippingInfo)?;

        let report = validate_shipping_info(&info);
        if !report.is_valid() {
            return Err(CheckoutError::Validation(report));
        }

        self.draft.shipping_info = Some(info);
        self.advance().await;
        Ok(self.draft.step)
    }

    /// Submit the shipping-method selection and advance to step three.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off step two,
    /// [`CheckoutError::MissingShippingMethod`] when nothing is selected.
    pub async fn submit_shipping_method(
        &mut self,
        method: Option<ShippingMethod>,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::ShippingMethod)?;

        let method = method.ok_or(CheckoutError::MissingShippingMethod)?;
        self.draft.shipping_method = Some(method);
        self.advance().await;
        Ok(self.draft.step)
    }

    /// Submit the payment-method selection and advance to confirmation.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off step three,
    /// [`CheckoutError::MissingPaymentMethod`] when nothing is selected.
    pub async fn submit_payment_method(
        &mut self,
        method: Option<PaymentMethod>,
    ) -> Result<CheckoutStep, CheckoutError> {
        self.expect_step(CheckoutStep::PaymentMethod)?;

        let method = method.ok_or(CheckoutError::MissingPaymentMethod)?;
        self.draft.payment_method = Some(method);
        self.advance().await;
        Ok(self.draft.step)
    }

    /// Step back one step. At step one this is a no-op.
    pub async fn back(&mut self) -> CheckoutStep {
        let previous = self.draft.step.previous();
        if previous != self.draft.step {
            self.draft.step = previous;
            self.persist().await;
        }
        self.draft.step
    }

    /// Assemble and submit the order, then clear cart and draft.
    ///
    /// Only a successful backend acknowledgment is destructive: on any
    /// failure the draft, the step, and the cart are all left intact so
    /// the customer can retry.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off the confirmation step,
    /// [`CheckoutError::NotAuthenticated`] without a signed-in customer,
    /// missing-section errors if storage was wiped mid-checkout, and
    /// [`CheckoutError::Submission`] for backend failures.
    pub async fn confirm<G, C>(
        &mut self,
        user: Option<&CurrentUser>,
        cart: &mut CartStore<C>,
        gateway: &G,
    ) -> Result<OrderConfirmation, CheckoutError>
    where
        G: OrderGateway,
        C: KeyValueStorage,
    {
        self.expect_step(CheckoutStep::Confirmation)?;
        let user = user.ok_or(CheckoutError::NotAuthenticated)?;

        let shipping_info = self
            .draft
            .shipping_info
            .as_ref()
            .ok_or(CheckoutError::MissingShippingInfo)?;
        let shipping_method = self
            .draft
            .shipping_method
            .ok_or(CheckoutError::MissingShippingMethod)?;
        let payment_method = self
            .draft
            .payment_method
            .ok_or(CheckoutError::MissingPaymentMethod)?;

        let payload = OrderPayload::assemble(
            user,
            cart.items(),
            shipping_info,
            shipping_method,
            payment_method,
        );

        let confirmation = gateway.submit_order(&payload).await?;

        // Destructive clears happen only past this point.
        self.draft = CheckoutDraft::default();
        storage::erase(&self.storage, keys::CHECKOUT_DRAFT).await;
        cart.clear().await;

        tracing::info!(code = %confirmation.code, "order placed");
        Ok(confirmation)
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.draft.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                current: self.draft.step,
            })
        }
    }

    async fn advance(&mut self) {
        self.draft.step = self.draft.step.next();
        self.persist().await;
    }

    async fn persist(&self) {
        storage::store(&self.storage, keys::CHECKOUT_DRAFT, &self.draft).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn complete_info() -> ShippingInfo {
        ShippingInfo {
            full_name: "Nguyen Thi Hoa".into(),
            phone: "0901234567".into(),
            email: None,
            address: "12 Hang Gai".into(),
            city: "Ha Noi".into(),
            city_code: "01".into(),
            district: "Hoan Kiem".into(),
            district_code: "002".into(),
            ward: "Hang Trong".into(),
            ward_code: "00070".into(),
        }
    }

    #[tokio::test]
    async fn test_starts_on_shipping_info() {
        let seq = CheckoutSequencer::load(MemoryStorage::new()).await;
        assert_eq!(seq.step(), CheckoutStep::ShippingInfo);
    }

    #[tokio::test]
    async fn test_valid_shipping_info_advances() {
        let mut seq = CheckoutSequencer::load(MemoryStorage::new()).await;
        let step = seq.submit_shipping_info(complete_info()).await.unwrap();
        assert_eq!(step, CheckoutStep::ShippingMethod);
    }

    #[tokio::test]
    async fn test_missing_ward_code_blocks_step_one() {
        let mut seq = CheckoutSequencer::load(MemoryStorage::new()).await;
        let mut info = complete_info();
        info.ward_code = String::new();

        let err = seq.submit_shipping_info(info).await.unwrap_err();
        match err {
            CheckoutError::Validation(report) => {
                assert_eq!(report.errors[0].field, "ward_code");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(seq.step(), CheckoutStep::ShippingInfo);
        assert!(seq.draft().shipping_info.is_none());
    }

    #[tokio::test]
    async fn test_unselected_methods_block_their_steps() {
        let mut seq = CheckoutSequencer::load(MemoryStorage::new()).await;
        seq.submit_shipping_info(complete_info()).await.unwrap();

        assert!(matches!(
            seq.submit_shipping_method(None).await,
            Err(CheckoutError::MissingShippingMethod)
        ));
        assert_eq!(seq.step(), CheckoutStep::ShippingMethod);

        seq.submit_shipping_method(Some(ShippingMethod::Standard))
            .await
            .unwrap();
        assert!(matches!(
            seq.submit_payment_method(None).await,
            Err(CheckoutError::MissingPaymentMethod)
        ));
        assert_eq!(seq.step(), CheckoutStep::PaymentMethod);
    }

    #[tokio::test]
    async fn test_no_skipping_steps() {
        let mut seq = CheckoutSequencer::load(MemoryStorage::new()).await;

        let err = seq
            .submit_payment_method(Some(PaymentMethod::CashOnDelivery))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::WrongStep {
                current: CheckoutStep::ShippingInfo
            }
        ));
    }

    #[tokio::test]
    async fn test_back_steps_one_and_stops_at_first() {
        let mut seq = CheckoutSequencer::load(MemoryStorage::new()).await;
        seq.submit_shipping_info(complete_info()).await.unwrap();
        seq.submit_shipping_method(Some(ShippingMethod::Standard))
            .await
            .unwrap();
        assert_eq!(seq.step(), CheckoutStep::PaymentMethod);

        assert_eq!(seq.back().await, CheckoutStep::ShippingMethod);
        assert_eq!(seq.back().await, CheckoutStep::ShippingInfo);
        assert_eq!(seq.back().await, CheckoutStep::ShippingInfo);
    }

    #[tokio::test]
    async fn test_draft_persists_across_reload() {
        let storage = MemoryStorage::new();
        {
            let mut seq = CheckoutSequencer::load(storage.clone()).await;
            seq.submit_shipping_info(complete_info()).await.unwrap();
            seq.submit_shipping_method(Some(ShippingMethod::Express))
                .await
                .unwrap();
        }

        let seq = CheckoutSequencer::load(storage).await;
        assert_eq!(seq.step(), CheckoutStep::PaymentMethod);
        assert_eq!(seq.draft().shipping_method, Some(ShippingMethod::Express));
        assert_eq!(
            seq.draft().shipping_info.as_ref().unwrap().ward_code,
            "00070"
        );
    }

    #[tokio::test]
    async fn test_malformed_draft_restores_fresh() {
        let storage = MemoryStorage::new();
        storage
            .put_raw(keys::CHECKOUT_DRAFT, "undefined".to_string())
            .await
            .unwrap();

        let seq = CheckoutSequencer::load(storage).await;
        assert_eq!(seq.step(), CheckoutStep::ShippingInfo);
        assert!(seq.draft().shipping_info.is_none());
    }

    #[test]
    fn test_submission_guard_rejects_reentry() {
        let guard = SubmissionGuard::new();
        let permit = guard.begin("session-1").unwrap();
        assert!(guard.begin("session-1").is_none());
        // A different session is unaffected
        assert!(guard.begin("session-2").is_some());

        drop(permit);
        assert!(guard.begin("session-1").is_some());
    }

    #[tokio::test]
    async fn test_cancelled_submission_releases_its_scope() {
        let guard = std::sync::Arc::new(SubmissionGuard::new());

        // A task holding the permit pends forever, like a gateway call
        // whose client has walked away.
        let (acquired_tx, acquired_rx) = tokio::sync::oneshot::channel();
        let task_guard = std::sync::Arc::clone(&guard);
        let task = tokio::spawn(async move {
            let _permit = task_guard.begin("session-1").unwrap();
            acquired_tx.send(()).unwrap();
            std::future::pending::<()>().await;
        });

        acquired_rx.await.unwrap();
        assert!(guard.begin("session-1").is_none());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        // The dropped permit released the scope; a retry is admitted
        assert!(guard.begin("session-1").is_some());
    }

    #[test]
    fn test_method_lookup_by_id() {
        assert_eq!(
            ShippingMethod::from_id("express"),
            Some(ShippingMethod::Express)
        );
        assert_eq!(ShippingMethod::from_id("carrier-pigeon"), None);
        assert_eq!(
            PaymentMethod::from_id("cod"),
            Some(PaymentMethod::CashOnDelivery)
        );
        assert_eq!(PaymentMethod::from_id(""), None);
    }

    #[test]
    fn test_step_indices() {
        assert_eq!(CheckoutStep::ShippingInfo.index(), 0);
        assert_eq!(CheckoutStep::Confirmation.index(), 3);
    }
}
