// src/models/billing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    #[schema(example = "Maria Oliveira")]
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientPayload {
    #[validate(length(min = 1, max = 200, message = "The patient name is required."))]
    pub full_name: String,

    #[validate(length(min = 6, max = 32, message = "The phone number is invalid."))]
    pub phone: Option<String>,

    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_plan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentPlanStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    pub id: Uuid,
    pub patient_id: Uuid,
    #[schema(example = "Tratamento ortodôntico")]
    pub description: String,
    // Valores em centavos. 0 <= paid_amount <= total_amount.
    pub total_amount: i64,
    pub paid_amount: i64,
    pub installments: i32,
    pub status: PaymentPlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentPlan {
    pub fn balance(&self) -> i64 {
        self.total_amount - self.paid_amount
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPlanPayload {
    #[validate(required(message = "The field 'patientId' is required."))]
    pub patient_id: Option<Uuid>,

    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,

    #[validate(
        required(message = "The total must be greater than zero."),
        range(min = 1i64, max = 1_000_000_000_000i64, message = "The total must be between 1 and 1000000000000.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i64, example = 120000)]
    pub total_amount: Option<i64>,

    #[validate(
        required(message = "Installments must be between 1 and 120."),
        range(min = 1, max = 120, message = "Installments must be between 1 and 120.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i32, example = 12)]
    pub installments: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub payment_plan_id: Option<Uuid>,
    pub amount: i64,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub patient_id: Uuid,
    pub payment_plan_id: Option<Uuid>,
    pub amount: i64,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    #[validate(required(message = "The field 'patientId' is required."))]
    pub patient_id: Option<Uuid>,

    pub payment_plan_id: Option<Uuid>,

    #[validate(
        required(message = "The amount must be greater than zero."),
        range(min = 1i64, max = 1_000_000_000_000i64, message = "The amount must be between 1 and 1000000000000.")
    )]
    #[serde(default, deserialize_with = "crate::models::lenient")]
    #[schema(value_type = i64, example = 30000)]
    pub amount: Option<i64>,

    pub method: PaymentMethod,

    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientBalance {
    pub patient_id: Uuid,
    pub open_plans: usize,
    pub balance: i64,
}
