// src/models/chamber.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::location::Coordinates;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "chamber_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChamberStatus {
    Active,
    Maintenance,
    Inactive,
}

// Uma câmara fria. As dimensões definem a grade de locais.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chamber {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quadras: i32,
    pub lados: i32,
    pub filas: i32,
    pub andares: i32,
    pub target_temperature: Option<Decimal>,
    pub current_temperature: Option<Decimal>,
    pub target_humidity: Option<Decimal>,
    pub current_humidity: Option<Decimal>,
    pub status: ChamberStatus,
    pub default_location_capacity_kg: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dimensões da grade Quadra × Lado × Fila × Andar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub quadras: i32,
    pub lados: i32,
    pub filas: i32,
    pub andares: i32,
}

impl Dimensions {
    pub fn total_locations(&self) -> i64 {
        i64::from(self.quadras) * i64::from(self.lados) * i64::from(self.filas) * i64::from(self.andares)
    }

    /// Todas as coordenadas da grade, em ordem quadra → lado → fila → andar.
    pub fn coordinates(&self) -> Vec<Coordinates> {
        let mut out = Vec::with_capacity(self.total_locations().max(0) as usize);
        for quadra in 1..=self.quadras {
            for lado in 1..=self.lados {
                for fila in 1..=self.filas {
                    for andar in 1..=self.andares {
                        out.push(Coordinates { quadra, lado, fila, andar });
                    }
                }
            }
        }
        out
    }

    pub fn contains(&self, c: &Coordinates) -> bool {
        c.is_valid()
            && c.quadra <= self.quadras
            && c.lado <= self.lados
            && c.fila <= self.filas
            && c.andar <= self.andares
    }

    /// `true` se alguma dimensão diminuiu em relação a `other`.
    pub fn shrinks_from(&self, other: &Dimensions) -> bool {
        self.quadras < other.quadras
            || self.lados < other.lados
            || self.filas < other.filas
            || self.andares < other.andares
    }
}

impl From<&Chamber> for Dimensions {
    fn from(c: &Chamber) -> Self {
        Self { quadras: c.quadras, lados: c.lados, filas: c.filas, andares: c.andares }
    }
}

// Resumo de ocupação de uma câmara
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChamberWithStats {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub chamber: Chamber,
    pub total_locations: i64,
    pub occupied_locations: i64,
    pub total_capacity_kg: Decimal,
    pub current_weight_kg: Decimal,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChamberPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    #[schema(example = "Câmara 01")]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Quadras deve estar entre 1 e 99."))]
    pub quadras: i32,
    #[validate(range(min = 1, max = 99, message = "Lados deve estar entre 1 e 99."))]
    pub lados: i32,
    #[validate(range(min = 1, max = 99, message = "Filas deve estar entre 1 e 99."))]
    pub filas: i32,
    #[validate(range(min = 1, max = 99, message = "Andares deve estar entre 1 e 99."))]
    pub andares: i32,
    pub target_temperature: Option<Decimal>,
    pub target_humidity: Option<Decimal>,
    pub status: Option<ChamberStatus>,
    /// Capacidade de cada local gerado (padrão da configuração)
    pub default_location_capacity_kg: Option<Decimal>,
}

// Campos ausentes mantêm o valor atual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChamberPayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Quadras deve estar entre 1 e 99."))]
    pub quadras: Option<i32>,
    #[validate(range(min = 1, max = 99, message = "Lados deve estar entre 1 e 99."))]
    pub lados: Option<i32>,
    #[validate(range(min = 1, max = 99, message = "Filas deve estar entre 1 e 99."))]
    pub filas: Option<i32>,
    #[validate(range(min = 1, max = 99, message = "Andares deve estar entre 1 e 99."))]
    pub andares: Option<i32>,
    pub target_temperature: Option<Decimal>,
    pub target_humidity: Option<Decimal>,
    pub status: Option<ChamberStatus>,
    pub default_location_capacity_kg: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChamberConditionsPayload {
    pub current_temperature: Option<Decimal>,
    pub current_humidity: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_total_and_shrink() {
        let small = Dimensions { quadras: 2, lados: 2, filas: 3, andares: 4 };
        let big = Dimensions { quadras: 2, lados: 2, filas: 5, andares: 4 };
        assert_eq!(small.total_locations(), 48);
        assert!(small.shrinks_from(&big));
        assert!(!big.shrinks_from(&small));
        assert!(!big.shrinks_from(&big));
    }

    #[test]
    fn grid_is_complete_and_ordered() {
        let d = Dimensions { quadras: 2, lados: 1, filas: 2, andares: 3 };
        let grid = d.coordinates();
        assert_eq!(grid.len() as i64, d.total_locations());
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(grid[0], Coordinates { quadra: 1, lado: 1, fila: 1, andar: 1 });
        assert_eq!(grid[grid.len() - 1], Coordinates { quadra: 2, lado: 1, fila: 2, andar: 3 });
        assert!(grid.iter().all(|c| d.contains(c)));
        assert!(!d.contains(&Coordinates { quadra: 3, lado: 1, fila: 1, andar: 1 }));
    }
}
