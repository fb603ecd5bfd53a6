//! Checkout route handlers.
//!
//! The sequencer and the cart are both rebuilt from session storage per
//! request. Entering checkout with an empty cart redirects to the cart
//! page before any step is served.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::Division;
use crate::cart::CartStore;
use crate::checkout::order::OrderConfirmation;
use crate::checkout::{
    CheckoutError, CheckoutSequencer, CheckoutStep, PaymentMethod, ShippingInfo, ShippingMethod,
};
use crate::error::{AppError, Result};
use crate::routes::auth::current_user;
use crate::state::AppState;
use crate::storage::SessionStorage;

/// A selectable shipping option.
#[derive(Debug, Serialize)]
pub struct ShippingOptionView {
    pub id: &'static str,
    pub name: &'static str,
    pub price: String,
}

/// A selectable payment option.
#[derive(Debug, Serialize)]
pub struct PaymentOptionView {
    pub id: &'static str,
    pub name: &'static str,
}

/// Checkout display data: current step, accumulated draft, totals.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub step_index: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<&'static str>,
    pub subtotal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_cost: Option<String>,
    pub total: String,
    pub shipping_options: Vec<ShippingOptionView>,
    pub payment_options: Vec<PaymentOptionView>,
}

fn checkout_view<S, C>(seq: &CheckoutSequencer<S>, cart: &CartStore<C>) -> CheckoutView
where
    S: crate::storage::KeyValueStorage,
    C: crate::storage::KeyValueStorage,
{
    let draft = seq.draft();
    let subtotal = cart.total();
    let shipping_cost = draft.shipping_method.map(ShippingMethod::price);
    let total = subtotal + shipping_cost.unwrap_or_default();

    CheckoutView {
        step: seq.step(),
        step_index: seq.step().index(),
        shipping_info: draft.shipping_info.clone(),
        shipping_method: draft.shipping_method.map(ShippingMethod::id),
        payment_method: draft.payment_method.map(PaymentMethod::id),
        subtotal: subtotal.to_string(),
        shipping_cost: shipping_cost.map(|price| price.to_string()),
        total: total.to_string(),
        shipping_options: ShippingMethod::ALL
            .into_iter()
            .map(|method| ShippingOptionView {
                id: method.id(),
                name: method.name(),
                price: method.price().to_string(),
            })
            .collect(),
        payment_options: PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentOptionView {
                id: method.id(),
                name: method.name(),
            })
            .collect(),
    }
}

/// Display the current checkout step.
///
/// Entry guard: an empty cart never reaches checkout.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Response {
    let storage = SessionStorage::new(session);
    let cart = CartStore::load(storage.clone()).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let seq = CheckoutSequencer::load(storage).await;
    Json(checkout_view(&seq, &cart)).into_response()
}

/// Step advance response.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub step: CheckoutStep,
    pub step_index: u8,
}

impl From<CheckoutStep> for StepResponse {
    fn from(step: CheckoutStep) -> Self {
        Self {
            step,
            step_index: step.index(),
        }
    }
}

/// Submit the shipping-info section (step one).
#[instrument(skip(session, form))]
pub async fn submit_shipping_info(
    session: Session,
    Form(form): Form<ShippingInfo>,
) -> Result<Json<StepResponse>> {
    let mut seq = CheckoutSequencer::load(SessionStorage::new(session)).await;
    let step = seq.submit_shipping_info(form).await?;
    Ok(Json(step.into()))
}

/// Method selection form data.
#[derive(Debug, Deserialize)]
pub struct MethodForm {
    pub id: Option<String>,
}

/// Submit the shipping-method selection (step two).
#[instrument(skip(session))]
pub async fn submit_shipping_method(
    session: Session,
    Form(form): Form<MethodForm>,
) -> Result<Json<StepResponse>> {
    let method = match form.id.as_deref() {
        None | Some("") => None,
        Some(id) => Some(ShippingMethod::from_id(id).ok_or_else(|| {
            AppError::BadRequest(format!("unknown shipping method {id:?}"))
        })?),
    };

    let mut seq = CheckoutSequencer::load(SessionStorage::new(session)).await;
    let step = seq.submit_shipping_method(method).await?;
    Ok(Json(step.into()))
}

/// Submit the payment-method selection (step three).
#[instrument(skip(session))]
pub async fn submit_payment_method(
    session: Session,
    Form(form): Form<MethodForm>,
) -> Result<Json<StepResponse>> {
    let method = match form.id.as_deref() {
        None | Some("") => None,
        Some(id) => Some(PaymentMethod::from_id(id).ok_or_else(|| {
            AppError::BadRequest(format!("unknown payment method {id:?}"))
        })?),
    };

    let mut seq = CheckoutSequencer::load(SessionStorage::new(session)).await;
    let step = seq.submit_payment_method(method).await?;
    Ok(Json(step.into()))
}

/// Step back one step.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Json<StepResponse> {
    let mut seq = CheckoutSequencer::load(SessionStorage::new(session)).await;
    let step = seq.back().await;
    Json(step.into())
}

/// Confirm the order (step four).
///
/// Requires a signed-in customer and rejects re-entrant submissions for
/// the same session. Only a successful backend acknowledgment clears
/// the cart and the draft; any failure leaves everything intact for a
/// retry.
#[instrument(skip(state, session))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OrderConfirmation>> {
    let user = current_user(&session).await;
    let scope = session
        .id()
        .map_or_else(|| "anonymous".to_owned(), |id| id.to_string());

    let storage = SessionStorage::new(session);
    let mut cart = CartStore::load(storage.clone()).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let mut seq = CheckoutSequencer::load(storage).await;

    // The permit releases on drop, so a request abandoned mid-await
    // cannot wedge its session.
    let Some(_permit) = state.submissions().begin(&scope) else {
        return Err(CheckoutError::SubmissionInFlight.into());
    };

    let confirmation = seq
        .confirm(user.as_ref(), &mut cart, state.commerce())
        .await?;

    Ok(Json(confirmation))
}

/// List provinces for the cascading address selector.
///
/// Lookup failures are non-fatal: the front end shows a dismissible
/// banner and leaves the dependent selects disabled until retried.
#[instrument(skip(state))]
pub async fn provinces(State(state): State<AppState>) -> Result<Json<Vec<Division>>> {
    Ok(Json(state.addresses().provinces().await?))
}

/// List districts for a province.
#[instrument(skip(state))]
pub async fn districts(
    State(state): State<AppState>,
    Path(province_code): Path<String>,
) -> Result<Json<Vec<Division>>> {
    Ok(Json(state.addresses().districts(&province_code).await?))
}

/// List wards for a district.
#[instrument(skip(state))]
pub async fn wards(
    State(state): State<AppState>,
    Path(district_code): Path<String>,
) -> Result<Json<Vec<Division>>> {
    Ok(Json(state.addresses().wards(&district_code).await?))
}
