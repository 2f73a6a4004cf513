// src/models/product.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

// --- Ciclo de vida do produto ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "product_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum ProductStatus {
    Cadastrado,         // "CADASTRADO"
    AguardandoLocacao,  // "AGUARDANDO_LOCACAO"
    Locado,             // "LOCADO"
    AguardandoRetirada, // "AGUARDANDO_RETIRADA"
    Retirado,           // "RETIRADO"
    Removido,           // "REMOVIDO"
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 6] = [
        ProductStatus::Cadastrado,
        ProductStatus::AguardandoLocacao,
        ProductStatus::Locado,
        ProductStatus::AguardandoRetirada,
        ProductStatus::Retirado,
        ProductStatus::Removido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Cadastrado => "CADASTRADO",
            ProductStatus::AguardandoLocacao => "AGUARDANDO_LOCACAO",
            ProductStatus::Locado => "LOCADO",
            ProductStatus::AguardandoRetirada => "AGUARDANDO_RETIRADA",
            ProductStatus::Retirado => "RETIRADO",
            ProductStatus::Removido => "REMOVIDO",
        }
    }

    /// Ativo = ocupa um local.
    pub fn is_active(&self) -> bool {
        matches!(self, ProductStatus::Locado | ProductStatus::AguardandoRetirada)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProductStatus::Retirado | ProductStatus::Removido)
    }

    pub fn can_transition_to(&self, next: ProductStatus) -> bool {
        use ProductStatus::*;
        match (self, next) {
            (Cadastrado, AguardandoLocacao | Locado | Removido) => true,
            (AguardandoLocacao, Locado | Removido) => true,
            // LOCADO -> LOCADO é a movimentação entre locais
            (Locado, Locado | AguardandoRetirada | Retirado | Removido) => true,
            (AguardandoRetirada, Locado | Retirado) => true,
            _ => false,
        }
    }

    /// Valida a transição e devolve o novo status.
    pub fn transition(self, next: ProductStatus) -> Result<ProductStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidStatusTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Produto (lote de sementes armazenado) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub lot: String,
    pub seed_type_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight_per_unit: Decimal,
    pub total_weight: Decimal,
    pub status: ProductStatus,
    pub storage_type: Option<String>,
    pub entry_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub version: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Quantidades e pesos ---

/// Maior valor de `quantity` / `weight_per_unit` (NUMERIC(12, 3)).
pub fn max_measure() -> Decimal {
    Decimal::new(999_999_999_999, 3)
}

/// Maior peso total de um produto (NUMERIC(14, 3)).
pub fn max_total_weight() -> Decimal {
    Decimal::new(99_999_999_999_999, 3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("{0} deve ser maior que zero.")]
    NotPositive(&'static str),

    #[error("{0} excede o máximo de 999999999,999.")]
    TooLarge(&'static str),

    #[error("O peso total excede o limite permitido.")]
    TotalTooLarge,

    #[error("O peso total resultante é zero; aumente a quantidade ou o peso por unidade.")]
    TotalNotPositive,
}

impl From<MeasureError> for AppError {
    fn from(e: MeasureError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// Arredonda para as 3 casas das colunas e confere a faixa (0, 999999999,999].
pub fn measure(value: Decimal, field: &'static str) -> Result<Decimal, MeasureError> {
    let value = value.round_dp(3).normalize();
    if value <= Decimal::ZERO {
        return Err(MeasureError::NotPositive(field));
    }
    if value > max_measure() {
        return Err(MeasureError::TooLarge(field));
    }
    Ok(value)
}

/// Peso total = quantidade × peso por unidade, com a precisão do banco.
/// Os fatores devem vir de `measure` para o total bater com o que fica gravado.
pub fn total_weight(quantity: Decimal, weight_per_unit: Decimal) -> Result<Decimal, MeasureError> {
    let weight = quantity
        .checked_mul(weight_per_unit)
        .ok_or(MeasureError::TotalTooLarge)?
        .round_dp(3)
        .normalize();
    if weight <= Decimal::ZERO {
        return Err(MeasureError::TotalNotPositive);
    }
    if weight > max_total_weight() {
        return Err(MeasureError::TotalTooLarge);
    }
    Ok(weight)
}

// Dados para criação de um produto (usado pela API e pela importação)
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub lot: String,
    pub seed_type_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight_per_unit: Decimal,
    pub storage_type: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

// Alterações de cadastro (campos ausentes ficam como estão)
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub lot: Option<String>,
    pub seed_type_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub weight_per_unit: Option<Decimal>,
    pub storage_type: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub expected_version: Option<i32>,
}

// Filtros de listagem de produtos
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub chamber_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub seed_type_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    /// Busca por nome ou lote
    pub search: Option<String>,
}

// --- Referências "populadas" (formato único na fronteira da API) ---
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LocationRef {
    pub id: Uuid,
    pub code: String,
    pub chamber: NamedRef,
}

// Linha crua do JOIN produto + local + câmara + tipo + cliente
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub location_code: Option<String>,
    pub chamber_id: Option<Uuid>,
    pub chamber_name: Option<String>,
    pub seed_type_name: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub location: Option<LocationRef>,
    pub seed_type: Option<NamedRef>,
    pub client: Option<NamedRef>,
}

impl From<ProductRow> for ProductDetail {
    fn from(row: ProductRow) -> Self {
        let location = match (row.product.location_id, row.location_code, row.chamber_id, row.chamber_name) {
            (Some(id), Some(code), Some(chamber_id), Some(chamber_name)) => Some(LocationRef {
                id,
                code,
                chamber: NamedRef { id: chamber_id, name: chamber_name },
            }),
            _ => None,
        };
        let seed_type = row
            .product
            .seed_type_id
            .zip(row.seed_type_name)
            .map(|(id, name)| NamedRef { id, name });
        let client = row
            .product
            .client_id
            .zip(row.client_name)
            .map(|(id, name)| NamedRef { id, name });

        Self { product: row.product, location, seed_type, client }
    }
}

// --- Payloads ---

// Quantidades e pesos vêm como decimais; o validator não tem `range` para eles
pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if let Err(e) = measure(*val, "O valor") {
        let mut err = ValidationError::new("range");
        err.message = Some(e.to_string().into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    #[schema(example = "Soja BRS 284")]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "O lote deve ter entre 1 e 100 caracteres."))]
    pub lot: String,
    pub seed_type_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// Com local o produto já entra LOCADO
    pub location_id: Option<Uuid>,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub weight_per_unit: Decimal,
    pub storage_type: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl From<CreateProductPayload> for NewProduct {
    fn from(p: CreateProductPayload) -> Self {
        Self {
            name: p.name,
            lot: p.lot,
            seed_type_id: p.seed_type_id,
            client_id: p.client_id,
            location_id: p.location_id,
            quantity: p.quantity,
            weight_per_unit: p.weight_per_unit,
            storage_type: p.storage_type,
            entry_date: p.entry_date,
            expiration_date: p.expiration_date,
            notes: p.notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchProductPayload {
    #[validate(length(min = 1, max = 500, message = "O lote deve ter entre 1 e 500 itens."), nested)]
    pub items: Vec<CreateProductPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "O lote deve ter entre 1 e 100 caracteres."))]
    pub lot: Option<String>,
    pub seed_type_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub weight_per_unit: Option<Decimal>,
    pub storage_type: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Versão conhecida pelo cliente; diferente da atual gera 409
    pub expected_version: Option<i32>,
}

impl From<UpdateProductPayload> for ProductChanges {
    fn from(p: UpdateProductPayload) -> Self {
        Self {
            name: p.name,
            lot: p.lot,
            seed_type_id: p.seed_type_id,
            client_id: p.client_id,
            quantity: p.quantity,
            weight_per_unit: p.weight_per_unit,
            storage_type: p.storage_type,
            expiration_date: p.expiration_date,
            notes: p.notes,
            expected_version: p.expected_version,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocateProductPayload {
    pub location_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveProductPayload {
    pub new_location_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialExitPayload {
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialMovePayload {
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    pub new_location_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStockPayload {
    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,
    /// Peso unitário da nova entrada (padrão: o atual)
    #[validate(custom(function = "validate_positive"))]
    pub weight_per_unit: Option<Decimal>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveProductQuery {
    /// Motivo da remoção
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProductStatus::*;

    #[test]
    fn allowed_transitions() {
        assert!(Cadastrado.can_transition_to(AguardandoLocacao));
        assert!(Cadastrado.can_transition_to(Locado));
        assert!(AguardandoLocacao.can_transition_to(Locado));
        assert!(Locado.can_transition_to(Locado));
        assert!(Locado.can_transition_to(AguardandoRetirada));
        assert!(AguardandoRetirada.can_transition_to(Locado));
        assert!(AguardandoRetirada.can_transition_to(Retirado));
    }

    #[test]
    fn terminal_states_never_leave() {
        for next in ProductStatus::ALL {
            assert!(!Retirado.can_transition_to(next));
            assert!(!Removido.can_transition_to(next));
        }
    }

    #[test]
    fn forbidden_transitions_return_error() {
        assert!(matches!(
            AguardandoLocacao.transition(AguardandoRetirada),
            Err(AppError::InvalidStatusTransition { from: AguardandoLocacao, to: AguardandoRetirada })
        ));
        assert!(AguardandoRetirada.transition(Removido).is_err());
        assert_eq!(Locado.transition(Retirado).ok(), Some(Retirado));
    }

    #[test]
    fn active_means_holding_a_location() {
        let active: Vec<_> = ProductStatus::ALL.into_iter().filter(|s| s.is_active()).collect();
        assert_eq!(active, vec![Locado, AguardandoRetirada]);
    }

    #[test]
    fn total_weight_is_quantity_times_unit_weight() {
        assert_eq!(total_weight(Decimal::new(40, 0), Decimal::new(255, 1)), Ok(Decimal::new(1020, 0)));
        assert_eq!(total_weight(Decimal::new(3, 0), Decimal::new(3333, 3)), Ok(Decimal::new(9999, 3)));
        assert_eq!(total_weight(Decimal::new(15, 1), Decimal::new(2125, 3)), Ok(Decimal::new(3188, 3)));
    }

    #[test]
    fn huge_values_are_rejected_without_panicking() {
        let huge = Decimal::from_str_exact("100000000000000000000").unwrap();
        assert_eq!(total_weight(huge, huge), Err(MeasureError::TotalTooLarge));
        assert_eq!(measure(huge, "Quantidade"), Err(MeasureError::TooLarge("Quantidade")));
        assert!(measure(max_measure(), "Quantidade").is_ok());
    }

    #[test]
    fn measures_are_rounded_before_the_total() {
        // Célula de planilha "=25/3"
        let unit = measure(Decimal::from_str_exact("8.333333333333334").unwrap(), "Peso").unwrap();
        assert_eq!(unit, Decimal::new(8333, 3));
        let total = total_weight(Decimal::from(30), unit).unwrap();
        assert_eq!(total, Decimal::from(30) * Decimal::new(8333, 3));
        assert_eq!(total, Decimal::new(24999, 2));
    }

    #[test]
    fn zero_total_weight_is_rejected() {
        let tiny = Decimal::new(1, 3);
        assert_eq!(total_weight(tiny, tiny), Err(MeasureError::TotalNotPositive));
        assert_eq!(measure(Decimal::new(4, 4), "Quantidade"), Err(MeasureError::NotPositive("Quantidade")));
    }

    #[test]
    fn payload_rejects_out_of_range_quantity() {
        let payload = CreateProductPayload {
            name: "Soja".into(),
            lot: "L-1".into(),
            seed_type_id: None,
            client_id: None,
            location_id: None,
            quantity: Decimal::from_str_exact("1000000000").unwrap(),
            weight_per_unit: Decimal::from(25),
            storage_type: None,
            entry_date: None,
            expiration_date: None,
            notes: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
    }

    #[test]
    fn payload_rejects_non_positive_weight() {
        let payload = CreateProductPayload {
            name: "Soja".into(),
            lot: "L-1".into(),
            seed_type_id: None,
            client_id: None,
            location_id: None,
            quantity: Decimal::from(10),
            weight_per_unit: Decimal::ZERO,
            storage_type: None,
            entry_date: None,
            expiration_date: None,
            notes: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("weight_per_unit"));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&AguardandoLocacao).unwrap(), "\"AGUARDANDO_LOCACAO\"");
        assert_eq!(AguardandoRetirada.to_string(), "AGUARDANDO_RETIRADA");
    }
}
