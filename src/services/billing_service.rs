// src/services/billing_service.rs

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::BillingStore,
    models::{
        audit::{AuditAction, NewAuditLog},
        billing::{
            CreatePatientPayload, CreatePaymentPlanPayload, NewPayment, Patient, PatientBalance,
            Payment, PaymentPlan, PaymentPlanStatus, RecordPaymentPayload,
        },
    },
    services::{
        audit_service::{format_changes, snapshot, AuditLogger},
        rbac_service::{
            Grant, PermPatientsCreate, PermPatientsRead, PermPaymentsCreate, PermPaymentsRead,
            PermPaymentsUpdate,
        },
    },
};

/// Novo estado do plano depois de aplicar um pagamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanUpdate {
    pub paid_amount: i64,
    pub status: PaymentPlanStatus,
}

/// Regra do plano: só planos ativos recebem, e nunca acima do saldo.
pub fn apply_payment(plan: &PaymentPlan, amount: i64) -> Result<PlanUpdate, AppError> {
    if plan.status != PaymentPlanStatus::Active {
        return Err(AppError::PaymentPlanClosed);
    }
    if amount > plan.balance() {
        return Err(AppError::PaymentExceedsBalance);
    }

    let paid_amount = plan.paid_amount + amount;
    let status = if paid_amount == plan.total_amount {
        PaymentPlanStatus::Completed
    } else {
        PaymentPlanStatus::Active
    };

    Ok(PlanUpdate { paid_amount, status })
}

fn required(field: &'static str) -> AppError {
    AppError::invalid_field(field, "required", format!("The field '{field}' is required."))
}

/// Soma dos saldos em i128; só vira i64 no fim, saturando.
pub fn total_balance(plans: &[PaymentPlan]) -> i64 {
    let sum: i128 = plans.iter().map(|p| i128::from(p.balance())).sum();
    i64::try_from(sum).unwrap_or(i64::MAX)
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn BillingStore>,
    audit: AuditLogger,
}

impl BillingService {
    pub fn new(store: Arc<dyn BillingStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    // --- PACIENTES ---

    pub async fn create_patient(
        &self,
        grant: &Grant<PermPatientsCreate>,
        payload: CreatePatientPayload,
    ) -> Result<Patient, AppError> {
        payload.validate()?;

        let patient = self.store.create_patient(&payload).await?;

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Create, "patients")
                    .entity(patient.id, patient.full_name.clone()),
            )
            .await;

        Ok(patient)
    }

    pub async fn list_patients(
        &self,
        _grant: &Grant<PermPatientsRead>,
    ) -> Result<Vec<Patient>, AppError> {
        self.store.list_patients().await
    }

    pub async fn get_patient(
        &self,
        _grant: &Grant<PermPatientsRead>,
        patient_id: Uuid,
    ) -> Result<Patient, AppError> {
        self.store
            .find_patient(patient_id)
            .await?
            .ok_or(AppError::PatientNotFound)
    }

    // --- PLANOS DE PAGAMENTO ---

    pub async fn create_payment_plan(
        &self,
        grant: &Grant<PermPaymentsCreate>,
        payload: CreatePaymentPlanPayload,
    ) -> Result<PaymentPlan, AppError> {
        payload.validate()?;
        let patient_id = payload.patient_id.ok_or_else(|| required("patient_id"))?;
        let total_amount = payload.total_amount.ok_or_else(|| required("total_amount"))?;
        let installments = payload.installments.ok_or_else(|| required("installments"))?;

        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or(AppError::PatientNotFound)?;

        let plan = self
            .store
            .create_plan(
                patient.id,
                &payload.description,
                total_amount,
                installments,
            )
            .await?;

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Create, "payments")
                    .entity(plan.id, patient.full_name),
            )
            .await;

        Ok(plan)
    }

    pub async fn cancel_payment_plan(
        &self,
        grant: &Grant<PermPaymentsUpdate>,
        plan_id: Uuid,
    ) -> Result<PaymentPlan, AppError> {
        let mut tx = self.store.begin_payment().await?;

        let plan = tx
            .find_plan_for_update(plan_id)
            .await?
            .ok_or(AppError::PaymentPlanNotFound)?;

        if plan.status != PaymentPlanStatus::Active {
            return Err(AppError::PaymentPlanClosed);
        }

        let cancelled = tx
            .update_plan(plan.id, plan.paid_amount, PaymentPlanStatus::Cancelled)
            .await?;
        tx.commit().await?;

        self.audit
            .record(
                NewAuditLog::new(grant.user_id(), AuditAction::Update, "payments")
                    .entity(cancelled.id, cancelled.description.clone())
                    .changes(format_changes(&snapshot(&plan), &snapshot(&cancelled))),
            )
            .await;

        Ok(cancelled)
    }

    // --- PAGAMENTOS ---

    /// Registra um pagamento. Com plano, trava o plano e atualiza o saldo na mesma transação.
    pub async fn record_payment(
        &self,
        grant: &Grant<PermPaymentsCreate>,
        payload: RecordPaymentPayload,
    ) -> Result<Payment, AppError> {
        payload.validate()?;
        let patient_id = payload.patient_id.ok_or_else(|| required("patient_id"))?;
        let amount = payload.amount.ok_or_else(|| required("amount"))?;

        let new_payment = NewPayment {
            patient_id,
            payment_plan_id: payload.payment_plan_id,
            amount,
            method: payload.method,
            notes: payload.notes,
            recorded_by: grant.user_id(),
        };

        let Some(plan_id) = payload.payment_plan_id else {
            // Pagamento avulso
            self.store
                .find_patient(patient_id)
                .await?
                .ok_or(AppError::PatientNotFound)?;

            let payment = self.store.insert_payment(&new_payment).await?;
            self.audit_payment(grant, &payment, None).await;
            return Ok(payment);
        };

        let mut tx = self.store.begin_payment().await?;

        let plan = tx
            .find_plan_for_update(plan_id)
            .await?
            .filter(|plan| plan.patient_id == patient_id)
            .ok_or(AppError::PaymentPlanNotFound)?;

        let update = apply_payment(&plan, new_payment.amount)?;

        let payment = tx.insert_payment(&new_payment).await?;
        let updated = tx.update_plan(plan.id, update.paid_amount, update.status).await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            plan_id = %plan.id,
            balance = updated.balance(),
            "Pagamento aplicado ao plano"
        );

        self.audit_payment(grant, &payment, Some((&plan, &updated))).await;

        Ok(payment)
    }

    async fn audit_payment(
        &self,
        grant: &Grant<PermPaymentsCreate>,
        payment: &Payment,
        plan: Option<(&PaymentPlan, &PaymentPlan)>,
    ) {
        let mut entry = NewAuditLog::new(grant.user_id(), AuditAction::Create, "payments")
            .entity(payment.id, format!("payment {}", payment.amount));

        if let Some((before, after)) = plan {
            entry = entry.changes(format_changes(
                &snapshot(&json!({ "paidAmount": before.paid_amount, "status": before.status })),
                &snapshot(&json!({ "paidAmount": after.paid_amount, "status": after.status })),
            ));
        }

        self.audit.record(entry).await;
    }

    /// Soma dos saldos dos planos ativos do paciente.
    pub async fn patient_balance(
        &self,
        _grant: &Grant<PermPaymentsRead>,
        patient_id: Uuid,
    ) -> Result<PatientBalance, AppError> {
        self.store
            .find_patient(patient_id)
            .await?
            .ok_or(AppError::PatientNotFound)?;

        let active: Vec<PaymentPlan> = self
            .store
            .list_plans_for_patient(patient_id)
            .await?
            .into_iter()
            .filter(|p| p.status == PaymentPlanStatus::Active)
            .collect();

        Ok(PatientBalance {
            patient_id,
            open_plans: active.len(),
            balance: total_balance(&active),
        })
    }
}
