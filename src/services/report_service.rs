// src/services/report_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{MovementRepository, ReportRepository},
    models::{
        movement::{MovementDetail, MovementFilter, MovementType},
        report::{CapacityReportLine, InventoryReport, InventoryReportLine, MovementReport},
    },
};

/// Monta o relatório de estoque com os totais.
pub fn summarize_inventory(lines: Vec<InventoryReportLine>) -> InventoryReport {
    let total_quantity = lines.iter().map(|l| l.quantity).sum();
    let total_weight_kg = lines.iter().map(|l| l.total_weight).sum();
    InventoryReport {
        generated_at: Utc::now(),
        total_products: lines.len(),
        total_quantity,
        total_weight_kg,
        lines,
    }
}

/// (peso de entradas, peso de saídas). Transferências e ajustes não contam.
pub fn movement_totals(movements: &[MovementDetail]) -> (Decimal, Decimal) {
    movements.iter().fold((Decimal::ZERO, Decimal::ZERO), |(entries, exits), m| {
        match m.movement.movement_type {
            MovementType::Entrada => (entries + m.movement.weight, exits),
            MovementType::Saida => (entries, exits + m.movement.weight),
            MovementType::Transferencia | MovementType::Ajuste => (entries, exits),
        }
    })
}

/// Peso armazenado sobre a capacidade, em % com duas casas.
pub fn utilization(current_kg: Decimal, capacity_kg: Decimal) -> Decimal {
    if capacity_kg <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current_kg * Decimal::ONE_HUNDRED / capacity_kg).round_dp(2)
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    movement_repo: MovementRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository, movement_repo: MovementRepository) -> Self {
        Self { repo, movement_repo }
    }

    pub async fn inventory(&self, chamber_id: Option<Uuid>, client_id: Option<Uuid>) -> Result<InventoryReport, AppError> {
        let lines = self.repo.inventory_lines(chamber_id, client_id).await?;
        Ok(summarize_inventory(lines))
    }

    pub async fn movements(&self, filter: &MovementFilter) -> Result<MovementReport, AppError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(AppError::BadRequest("A data inicial é posterior à data final.".into()));
            }
        }
        let movements = self.movement_repo.list_all(filter).await?;
        let (total_entries_kg, total_exits_kg) = movement_totals(&movements);
        Ok(MovementReport {
            generated_at: Utc::now(),
            from: filter.from,
            to: filter.to,
            total_entries_kg,
            total_exits_kg,
            movements,
        })
    }

    pub async fn capacity(&self) -> Result<Vec<CapacityReportLine>, AppError> {
        let mut lines = self.repo.capacity_lines().await?;
        for line in lines.iter_mut() {
            line.utilization_rate = utilization(line.current_weight_kg, line.total_capacity_kg);
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movement::Movement;

    fn movement(movement_type: MovementType, weight: i64) -> MovementDetail {
        MovementDetail {
            movement: Movement {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                movement_type,
                from_location_id: None,
                to_location_id: None,
                quantity: Decimal::ONE,
                weight: Decimal::from(weight),
                user_id: None,
                reason: None,
                notes: None,
                created_at: Utc::now(),
            },
            product_name: "Milho".into(),
            product_lot: "M-1".into(),
            from_location_code: None,
            to_location_code: None,
            user_name: None,
        }
    }

    #[test]
    fn totals_count_only_entries_and_exits() {
        let movements = vec![
            movement(MovementType::Entrada, 500),
            movement(MovementType::Entrada, 250),
            movement(MovementType::Saida, 100),
            movement(MovementType::Transferencia, 999),
            movement(MovementType::Ajuste, 30),
        ];
        assert_eq!(movement_totals(&movements), (Decimal::from(750), Decimal::from(100)));
    }

    #[test]
    fn utilization_handles_empty_chamber() {
        assert_eq!(utilization(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(utilization(Decimal::from(250), Decimal::from(1000)), Decimal::from(25));
    }
}
