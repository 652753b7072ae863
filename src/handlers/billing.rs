// src/handlers/billing.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, payload::Payload, rbac::RequirePermission},
    models::billing::{
        CreatePatientPayload, CreatePaymentPlanPayload, Patient, PatientBalance, Payment,
        PaymentPlan, RecordPaymentPayload,
    },
    services::rbac_service::{
        PermPatientsCreate, PermPatientsRead, PermPaymentsCreate, PermPaymentsRead,
        PermPaymentsUpdate,
    },
};

// GET /api/patients
#[utoipa::path(
    get,
    path = "/api/patients",
    tag = "Patients",
    responses((status = 200, body = [Patient])),
    security(("api_jwt" = []))
)]
pub async fn list_patients(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPatientsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let patients = app_state
        .billing_service
        .list_patients(&grant)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(patients))
}

// POST /api/patients
#[utoipa::path(
    post,
    path = "/api/patients",
    tag = "Patients",
    request_body = CreatePatientPayload,
    responses((status = 201, body = Patient), (status = 400)),
    security(("api_jwt" = []))
)]
pub async fn create_patient(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPatientsCreate>,
    Payload(payload): Payload<CreatePatientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = app_state
        .billing_service
        .create_patient(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(patient)))
}

// GET /api/patients/{id}
#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    tag = "Patients",
    params(("id" = Uuid, Path, description = "Paciente")),
    responses((status = 200, body = Patient), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn get_patient(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPatientsRead>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = app_state
        .billing_service
        .get_patient(&grant, patient_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(patient))
}

// GET /api/patients/{id}/balance
#[utoipa::path(
    get,
    path = "/api/patients/{id}/balance",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "Paciente")),
    responses((status = 200, body = PatientBalance), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn patient_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPaymentsRead>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = app_state
        .billing_service
        .patient_balance(&grant, patient_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(balance))
}

// POST /api/payment-plans
#[utoipa::path(
    post,
    path = "/api/payment-plans",
    tag = "Payments",
    request_body = CreatePaymentPlanPayload,
    responses((status = 201, body = PaymentPlan), (status = 400), (status = 404)),
    security(("api_jwt" = []))
)]
pub async fn create_payment_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPaymentsCreate>,
    Payload(payload): Payload<CreatePaymentPlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .billing_service
        .create_payment_plan(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// POST /api/payment-plans/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/payment-plans/{id}/cancel",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "Plano de pagamento")),
    responses((status = 200, body = PaymentPlan), (status = 404), (status = 422)),
    security(("api_jwt" = []))
)]
pub async fn cancel_payment_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPaymentsUpdate>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .billing_service
        .cancel_payment_plan(&grant, plan_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plan))
}

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, body = Payment),
        (status = 404, description = "Paciente ou plano não encontrado"),
        (status = 422, description = "Plano encerrado ou valor acima do saldo")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    RequirePermission(grant): RequirePermission<PermPaymentsCreate>,
    Payload(payload): Payload<RecordPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = app_state
        .billing_service
        .record_payment(&grant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payment)))
}
