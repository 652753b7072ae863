// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Tabelas de mensagens por idioma. A chave vem de `AppError::key()`.
const EN: &[(&str, &str)] = &[
    ("NOT_AUTHENTICATED", "Not authenticated"),
    ("UNAUTHORIZED", "Unauthorized"),
    ("VALIDATION_ERROR", "One or more fields are invalid."),
    ("PRODUCT_NOT_FOUND", "Product not found"),
    ("INSUFFICIENT_STOCK", "Insufficient stock"),
    ("PATIENT_NOT_FOUND", "Patient not found"),
    ("PAYMENT_PLAN_NOT_FOUND", "Payment plan not found"),
    ("PAYMENT_EXCEEDS_BALANCE", "Payment exceeds the remaining balance"),
    ("PAYMENT_PLAN_CLOSED", "Payment plan is not active"),
    ("ROLE_NOT_FOUND", "Role not found"),
    ("ROLE_NAME_ALREADY_EXISTS", "A role with this name already exists"),
    ("UNIQUE_CONSTRAINT_VIOLATION", "A record with this value already exists"),
    ("INVALID_CREDENTIALS", "Invalid email or password"),
    ("INVALID_TOKEN", "Invalid or missing authentication token"),
    ("USER_NOT_FOUND", "User not found"),
    ("INTERNAL_SERVER_ERROR", "An unexpected error occurred"),
];

const PT: &[(&str, &str)] = &[
    ("NOT_AUTHENTICATED", "Não autenticado"),
    ("UNAUTHORIZED", "Sem permissão"),
    ("VALIDATION_ERROR", "Um ou mais campos são inválidos."),
    ("PRODUCT_NOT_FOUND", "Produto não encontrado"),
    ("INSUFFICIENT_STOCK", "Estoque insuficiente"),
    ("PATIENT_NOT_FOUND", "Paciente não encontrado"),
    ("PAYMENT_PLAN_NOT_FOUND", "Plano de pagamento não encontrado"),
    ("PAYMENT_EXCEEDS_BALANCE", "O pagamento excede o saldo restante"),
    ("PAYMENT_PLAN_CLOSED", "O plano de pagamento não está ativo"),
    ("ROLE_NOT_FOUND", "Cargo não encontrado"),
    ("ROLE_NAME_ALREADY_EXISTS", "Já existe um cargo com esse nome"),
    ("UNIQUE_CONSTRAINT_VIOLATION", "Já existe um registro com esse valor"),
    ("INVALID_CREDENTIALS", "E-mail ou senha inválidos"),
    ("INVALID_TOKEN", "Token de autenticação inválido ou ausente"),
    ("USER_NOT_FOUND", "Usuário não encontrado"),
    ("INTERNAL_SERVER_ERROR", "Ocorreu um erro inesperado"),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    tables: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut tables = HashMap::new();
        tables.insert("en", EN.iter().copied().collect());
        tables.insert("pt", PT.iter().copied().collect());
        Self { tables }
    }
}

impl I18nStore {
    /// Busca a mensagem no idioma pedido, caindo para inglês e, por fim, para a própria chave.
    pub fn get(&self, lang: &str, key: &str) -> String {
        self.tables
            .get(lang)
            .and_then(|t| t.get(key))
            .or_else(|| self.tables.get(DEFAULT_LANG).and_then(|t| t.get(key)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
