// tests/common/mod.rs
//
// Stores em memória para testar services e rotas sem Postgres.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use clinic_backend::{
    common::error::AppError,
    config::AppState,
    db::{
        stock_overflow, AuditStore, BillingStore, InventoryStore, PaymentTransaction, RbacStore,
        SaleTransaction, Stores, UserStore,
    },
    models::{
        audit::{AuditLogEntry, AuditLogQuery, NewAuditLog},
        auth::User,
        billing::{
            CreatePatientPayload, NewPayment, Patient, Payment, PaymentPlan, PaymentPlanStatus,
        },
        inventory::{CreateProductPayload, NewSale, Product, Sale},
        rbac::{Permission, PermissionPair, Role},
    },
    services::rbac_service::{Grant, PermissionDef},
};

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "s3cret-pass";

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    permissions: Vec<Permission>,
    role_permissions: HashMap<Uuid, HashSet<Uuid>>,
    products: HashMap<Uuid, Product>,
    sales: Vec<Sale>,
    patients: HashMap<Uuid, Patient>,
    plans: HashMap<Uuid, PaymentPlan>,
    payments: Vec<Payment>,
    audit: Vec<AuditLogEntry>,
}

/// Implementa todos os stores sobre o mesmo estado.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    // Faz o papel do `SELECT ... FOR UPDATE`: uma transação por vez
    sale_lock: Arc<AsyncMutex<()>>,
    payment_lock: Arc<AsyncMutex<()>>,
    pub fail_decrement: Arc<AtomicBool>,
    pub fail_plan_update: Arc<AtomicBool>,
    pub fail_audit: Arc<AtomicBool>,
    pub fail_role_lookup: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn stores(&self) -> Stores {
        let shared = Arc::new(self.clone());
        Stores {
            users: shared.clone(),
            rbac: shared.clone(),
            inventory: shared.clone(),
            billing: shared.clone(),
            audit: shared,
        }
    }

    pub fn add_user(&self, email: &str, role_id: Option<Uuid>) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: email.to_string(),
            // custo mínimo para os testes não ficarem lentos
            password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
            role_id,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        user
    }

    pub fn add_product(&self, stock: i32, per_pack: Option<i32>) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: "Luva nitrílica".into(),
            sku: format!("LUV-{}", Uuid::new_v4().simple()),
            stock_quantity: stock,
            quantity_per_pack: per_pack,
            sale_price: 1500,
            cost_price: 900,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product.id, product.clone());
        product
    }

    pub fn add_patient(&self, name: &str) -> Patient {
        let patient = Patient {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            phone: None,
            email: None,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .patients
            .insert(patient.id, patient.clone());
        patient
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        self.state.lock().unwrap().products.get(&id).cloned()
    }

    pub fn plan(&self, id: Uuid) -> Option<PaymentPlan> {
        self.state.lock().unwrap().plans.get(&id).cloned()
    }

    pub fn sales(&self) -> Vec<Sale> {
        self.state.lock().unwrap().sales.clone()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.state.lock().unwrap().payments.clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().unwrap().audit.clone()
    }

    pub fn delete_user(&self, id: Uuid) {
        self.state.lock().unwrap().users.remove(&id);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<User, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::RoleNotFound);
        }
        let user = state.users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
        user.role_id = Some(role_id);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

fn grant_pairs(state: &mut State, role_id: Uuid, pairs: &[PermissionPair]) {
    let ids: Vec<Uuid> = state
        .permissions
        .iter()
        .filter(|p| pairs.contains(&PermissionPair::from(*p)))
        .map(|p| p.id)
        .collect();
    state.role_permissions.entry(role_id).or_default().extend(ids);
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, AppError> {
        if self.fail_role_lookup.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("connection reset")));
        }
        let state = self.state.lock().unwrap();
        let granted = state.role_permissions.get(&role_id).cloned().unwrap_or_default();
        Ok(state
            .permissions
            .iter()
            .filter(|p| granted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        Ok(self.state.lock().unwrap().permissions.clone())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let mut roles: Vec<Role> = self.state.lock().unwrap().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<Role>, AppError> {
        Ok(self.state.lock().unwrap().roles.get(&id).cloned())
    }

    async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &[PermissionPair],
    ) -> Result<Role, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.roles.values().any(|r| r.name == name) {
            return Err(AppError::RoleNameAlreadyExists(name.to_string()));
        }
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        state.roles.insert(role.id, role.clone());
        grant_pairs(&mut state, role.id, permissions);
        Ok(role)
    }

    async fn sync_catalog(
        &self,
        catalog: &[PermissionPair],
        admin_role: &str,
    ) -> Result<Role, AppError> {
        let mut state = self.state.lock().unwrap();
        for pair in catalog {
            let exists = state
                .permissions
                .iter()
                .any(|p| p.module == pair.module && p.action == pair.action);
            if !exists {
                state.permissions.push(Permission {
                    id: Uuid::new_v4(),
                    module: pair.module.clone(),
                    action: pair.action.clone(),
                });
            }
        }

        let admin = match state.roles.values().find(|r| r.name == admin_role) {
            Some(role) => role.clone(),
            None => {
                let role = Role {
                    id: Uuid::new_v4(),
                    name: admin_role.to_string(),
                    description: Some("Full access to every module".into()),
                    created_at: Utc::now(),
                };
                state.roles.insert(role.id, role.clone());
                role
            }
        };
        grant_pairs(&mut state, admin.id, catalog);
        Ok(admin)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> =
            self.state.lock().unwrap().products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn create_product(&self, input: &CreateProductPayload) -> Result<Product, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.products.values().any(|p| p.sku == input.sku) {
            return Err(AppError::UniqueConstraintViolation("sku".into()));
        }
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            sku: input.sku.clone(),
            stock_quantity: input.stock_quantity,
            quantity_per_pack: input.quantity_per_pack,
            sale_price: input.sale_price,
            cost_price: input.cost_price,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn restock(&self, product_id: Uuid, packs: i32) -> Result<Option<Product>, AppError> {
        let mut state = self.state.lock().unwrap();
        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(None);
        };
        product.stock_quantity = product
            .stock_quantity
            .checked_add(packs)
            .ok_or_else(stock_overflow)?;
        Ok(Some(product.clone()))
    }

    async fn list_sales(&self, product_id: Option<Uuid>) -> Result<Vec<Sale>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sales
            .iter()
            .filter(|s| product_id.is_none_or(|id| s.product_id == id))
            .cloned()
            .collect())
    }

    async fn begin_sale(&self) -> Result<Box<dyn SaleTransaction>, AppError> {
        let guard = self.sale_lock.clone().lock_owned().await;
        Ok(Box::new(MemorySaleTx {
            store: self.clone(),
            _guard: guard,
            sales: Vec::new(),
            stock: HashMap::new(),
        }))
    }
}

/// Escritas ficam pendentes até o `commit`; o drop descarta tudo.
pub struct MemorySaleTx {
    store: MemoryStore,
    _guard: OwnedMutexGuard<()>,
    sales: Vec<Sale>,
    stock: HashMap<Uuid, i32>,
}

impl MemorySaleTx {
    fn current(&self, id: Uuid) -> Option<Product> {
        let mut product = self.store.product(id)?;
        if let Some(stock) = self.stock.get(&id) {
            product.stock_quantity = *stock;
        }
        Some(product)
    }
}

#[async_trait]
impl SaleTransaction for MemorySaleTx {
    async fn find_product_for_update(&mut self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.current(id))
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, AppError> {
        let sale = Sale {
            id: Uuid::new_v4(),
            product_id: sale.product_id,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            cost_price: sale.cost_price,
            total_amount: sale.total_amount,
            profit: sale.profit,
            sold_by: Some(sale.sold_by),
            created_at: Utc::now(),
        };
        self.sales.push(sale.clone());
        Ok(sale)
    }

    async fn decrement_stock(&mut self, product_id: Uuid, packs: i32) -> Result<Product, AppError> {
        if self.store.fail_decrement.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("disk full")));
        }
        let mut product = self.current(product_id).ok_or(AppError::ProductNotFound)?;
        if product.stock_quantity < packs {
            return Err(AppError::InsufficientStock);
        }
        product.stock_quantity -= packs;
        self.stock.insert(product_id, product.stock_quantity);
        Ok(product)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let mut state = self.store.state.lock().unwrap();
        for (id, stock) in &self.stock {
            if let Some(p) = state.products.get_mut(id) {
                p.stock_quantity = *stock;
            }
        }
        state.sales.extend(self.sales.iter().cloned());
        Ok(())
    }
}

fn build_payment(payment: &NewPayment) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        patient_id: payment.patient_id,
        payment_plan_id: payment.payment_plan_id,
        amount: payment.amount,
        method: payment.method,
        notes: payment.notes.clone(),
        recorded_by: Some(payment.recorded_by),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn create_patient(&self, input: &CreatePatientPayload) -> Result<Patient, AppError> {
        let patient = Patient {
            id: Uuid::new_v4(),
            full_name: input.full_name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .patients
            .insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, AppError> {
        let mut patients: Vec<Patient> =
            self.state.lock().unwrap().patients.values().cloned().collect();
        patients.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(patients)
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, AppError> {
        Ok(self.state.lock().unwrap().patients.get(&id).cloned())
    }

    async fn create_plan(
        &self,
        patient_id: Uuid,
        description: &str,
        total_amount: i64,
        installments: i32,
    ) -> Result<PaymentPlan, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.patients.contains_key(&patient_id) {
            return Err(AppError::PatientNotFound);
        }
        let now = Utc::now();
        let plan = PaymentPlan {
            id: Uuid::new_v4(),
            patient_id,
            description: description.to_string(),
            total_amount,
            paid_amount: 0,
            installments,
            status: PaymentPlanStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn list_plans_for_patient(&self, patient_id: Uuid) -> Result<Vec<PaymentPlan>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .plans
            .values()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        let payment = build_payment(payment);
        self.state.lock().unwrap().payments.push(payment.clone());
        Ok(payment)
    }

    async fn begin_payment(&self) -> Result<Box<dyn PaymentTransaction>, AppError> {
        let guard = self.payment_lock.clone().lock_owned().await;
        Ok(Box::new(MemoryPaymentTx {
            store: self.clone(),
            _guard: guard,
            payments: Vec::new(),
            plans: HashMap::new(),
        }))
    }
}

pub struct MemoryPaymentTx {
    store: MemoryStore,
    _guard: OwnedMutexGuard<()>,
    payments: Vec<Payment>,
    plans: HashMap<Uuid, PaymentPlan>,
}

#[async_trait]
impl PaymentTransaction for MemoryPaymentTx {
    async fn find_plan_for_update(&mut self, id: Uuid) -> Result<Option<PaymentPlan>, AppError> {
        if let Some(plan) = self.plans.get(&id) {
            return Ok(Some(plan.clone()));
        }
        Ok(self.store.plan(id))
    }

    async fn insert_payment(&mut self, payment: &NewPayment) -> Result<Payment, AppError> {
        let payment = build_payment(payment);
        self.payments.push(payment.clone());
        Ok(payment)
    }

    async fn update_plan(
        &mut self,
        id: Uuid,
        paid_amount: i64,
        status: PaymentPlanStatus,
    ) -> Result<PaymentPlan, AppError> {
        if self.store.fail_plan_update.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("deadlock detected")));
        }
        let mut plan = self
            .find_plan_for_update(id)
            .await?
            .ok_or(AppError::PaymentPlanNotFound)?;
        plan.paid_amount = paid_amount;
        plan.status = status;
        plan.updated_at = Utc::now();
        self.plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let mut state = self.store.state.lock().unwrap();
        for (id, plan) in &self.plans {
            state.plans.insert(*id, plan.clone());
        }
        state.payments.extend(self.payments.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert(&self, entry: &NewAuditLog) -> Result<AuditLogEntry, AppError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("audit table locked")));
        }
        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;
        let row = AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action,
            module: entry.module.clone(),
            entity_id: entry.entity_id.clone(),
            entity_name: entry.entity_name.clone(),
            changes,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().audit.push(row.clone());
        Ok(row)
    }

    async fn list(&self, query: &AuditLogQuery, limit: i64) -> Result<Vec<AuditLogEntry>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| query.module.as_ref().is_none_or(|m| &e.module == m))
            .filter(|e| query.user_id.is_none_or(|u| e.user_id == Some(u)))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// App completo sobre o `MemoryStore`, com catálogo sincronizado e um admin.
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    pub admin_role: Role,
    pub admin: User,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = MemoryStore::default();
        let state = AppState::from_stores(
            store.stores(),
            JWT_SECRET.to_string(),
            chrono::Duration::hours(1),
        );
        let admin_role = state.rbac_service.sync_catalog().await.unwrap();
        let admin = store.add_user("admin@clinica.com", Some(admin_role.id));

        Self {
            store,
            state,
            admin_role,
            admin,
        }
    }

    /// Cria um cargo com os pares dados e um usuário nele.
    pub async fn user_with(&self, email: &str, pairs: &[(&str, &str)]) -> User {
        let pairs: Vec<PermissionPair> = pairs
            .iter()
            .map(|(m, a)| PermissionPair::new(m, a))
            .collect();
        let role = RbacStore::create_role(&self.store, &format!("role-{email}"), None, &pairs)
            .await
            .unwrap();
        self.store.add_user(email, Some(role.id))
    }

    pub async fn grant<P: PermissionDef>(&self, user: &User) -> Grant<P> {
        self.state.rbac_service.authorize::<P>(user.id).await.unwrap()
    }

    pub async fn admin_grant<P: PermissionDef>(&self) -> Grant<P> {
        self.grant::<P>(&self.admin).await
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.auth_service.issue_token(user.id).unwrap()
    }
}
