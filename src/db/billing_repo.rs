// src/db/billing_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BillingStore, PaymentTransaction},
    models::billing::{
        CreatePatientPayload, NewPayment, Patient, Payment, PaymentPlan, PaymentPlanStatus,
    },
};

const PLAN_COLUMNS: &str = "id, patient_id, description, total_amount, paid_amount, \
                            installments, status, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, patient_id, payment_plan_id, amount, method, notes, \
                               recorded_by, created_at";

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Usado tanto pelo pagamento avulso quanto pela transação do plano
async fn insert_payment_with<'e, E>(executor: E, payment: &NewPayment) -> Result<Payment, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (patient_id, payment_plan_id, amount, method, notes, recorded_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
        .bind(payment.patient_id)
        .bind(payment.payment_plan_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.notes.as_deref())
        .bind(payment.recorded_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_foreign_key_violation() {
                    return AppError::PatientNotFound;
                }
            }
            e.into()
        })
}

#[async_trait]
impl BillingStore for BillingRepository {
    async fn create_patient(&self, input: &CreatePatientPayload) -> Result<Patient, AppError> {
        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (full_name, phone, email)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, phone, email, created_at
            "#,
        )
            .bind(&input.full_name)
            .bind(input.phone.as_deref())
            .bind(input.email.as_deref())
            .fetch_one(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, AppError> {
        let patients = sqlx::query_as::<_, Patient>(
            "SELECT id, full_name, phone, email, created_at FROM patients ORDER BY full_name ASC",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(patients)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        let patient = sqlx::query_as::<_, Patient>(
            "SELECT id, full_name, phone, email, created_at FROM patients WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn create_plan(
        &self,
        patient_id: Uuid,
        description: &str,
        total_amount: i64,
        installments: i32,
    ) -> Result<PaymentPlan, AppError> {
        sqlx::query_as::<_, PaymentPlan>(&format!(
            r#"
            INSERT INTO payment_plans (patient_id, description, total_amount, installments)
            VALUES ($1, $2, $3, $4)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
            .bind(patient_id)
            .bind(description)
            .bind(total_amount)
            .bind(installments)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::PatientNotFound;
                    }
                }
                e.into()
            })
    }

    async fn list_plans_for_patient(&self, patient_id: Uuid) -> Result<Vec<PaymentPlan>, AppError> {
        let plans = sqlx::query_as::<_, PaymentPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM payment_plans WHERE patient_id = $1 ORDER BY created_at ASC"
        ))
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(plans)
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        insert_payment_with(&self.pool, payment).await
    }

    async fn begin_payment(&self) -> Result<Box<dyn PaymentTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPaymentTransaction { tx }))
    }
}

pub struct PgPaymentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PaymentTransaction for PgPaymentTransaction {
    async fn find_plan_for_update(&mut self, id: Uuid) -> Result<Option<PaymentPlan>, AppError> {
        let plan = sqlx::query_as::<_, PaymentPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM payment_plans WHERE id = $1 FOR UPDATE"
        ))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(plan)
    }

    async fn insert_payment(&mut self, payment: &NewPayment) -> Result<Payment, AppError> {
        insert_payment_with(&mut *self.tx, payment).await
    }

    async fn update_plan(
        &mut self,
        id: Uuid,
        paid_amount: i64,
        status: PaymentPlanStatus,
    ) -> Result<PaymentPlan, AppError> {
        sqlx::query_as::<_, PaymentPlan>(&format!(
            r#"
            UPDATE payment_plans
            SET paid_amount = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "#
        ))
            .bind(id)
            .bind(paid_amount)
            .bind(status)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(AppError::PaymentPlanNotFound)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
