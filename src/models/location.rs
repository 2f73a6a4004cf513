// src/models/location.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::product::{validate_positive, ProductDetail};

// Um local de armazenagem, endereçado por (quadra, lado, fila, andar).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub chamber_id: Uuid,
    pub quadra: i32,
    pub lado: i32,
    pub fila: i32,
    pub andar: i32,
    #[schema(example = "Q01-L02-F03-A01")]
    pub code: String,
    pub is_occupied: bool,
    pub max_capacity_kg: Decimal,
    pub current_weight_kg: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { quadra: self.quadra, lado: self.lado, fila: self.fila, andar: self.andar }
    }

    pub fn available_kg(&self) -> Decimal {
        self.max_capacity_kg - self.current_weight_kg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub quadra: i32,
    pub lado: i32,
    pub fila: i32,
    pub andar: i32,
}

impl Coordinates {
    /// Código legível do local: `Q01-L02-F03-A04`.
    pub fn code(&self) -> String {
        format!(
            "Q{:02}-L{:02}-F{:02}-A{:02}",
            self.quadra, self.lado, self.fila, self.andar
        )
    }

    pub fn is_valid(&self) -> bool {
        self.quadra >= 1 && self.lado >= 1 && self.fila >= 1 && self.andar >= 1
    }
}

// Local + câmara (para listagens e sugestões)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationWithChamber {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub location: Location,
    pub chamber_name: String,
}

// Detalhe do local com o produto ativo, se houver
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: LocationWithChamber,
    pub product: Option<ProductDetail>,
}

// Filtros de listagem (?chamberId=...&occupied=false&quadra=2)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LocationFilter {
    pub chamber_id: Option<Uuid>,
    pub occupied: Option<bool>,
    pub quadra: Option<i32>,
    pub lado: Option<i32>,
    pub fila: Option<i32>,
    pub andar: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailableLocationQuery {
    pub chamber_id: Option<Uuid>,
    /// Capacidade livre mínima exigida
    pub min_capacity_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OptimalLocationQuery {
    /// Peso que precisa ser armazenado
    pub weight_kg: Decimal,
    pub chamber_id: Option<Uuid>,
    /// Quantas sugestões devolver (padrão 5)
    pub limit: Option<usize>,
}

// Sugestão de local ótimo
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSuggestion {
    #[serde(flatten)]
    pub location: LocationWithChamber,
    /// Capacidade que sobra após armazenar o peso pedido
    pub wasted_capacity_kg: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationPayload {
    #[validate(custom(function = "validate_positive"))]
    pub max_capacity_kg: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        let c = Coordinates { quadra: 1, lado: 2, fila: 10, andar: 3 };
        assert_eq!(c.code(), "Q01-L02-F10-A03");
    }

    #[test]
    fn coordinates_order_is_quadra_lado_fila_andar() {
        let a = Coordinates { quadra: 1, lado: 2, fila: 1, andar: 1 };
        let b = Coordinates { quadra: 2, lado: 1, fila: 1, andar: 1 };
        let c = Coordinates { quadra: 1, lado: 2, fila: 1, andar: 2 };
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn zero_coordinate_is_invalid() {
        assert!(!Coordinates { quadra: 0, lado: 1, fila: 1, andar: 1 }.is_valid());
        assert!(Coordinates { quadra: 1, lado: 1, fila: 1, andar: 1 }.is_valid());
    }
}
