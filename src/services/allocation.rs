// src/services/allocation.rs
//
// Regras de alocação: "um local = um produto", capacidade e escolha do local ótimo.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::location::{Location, LocationSuggestion, LocationWithChamber},
};

pub const DEFAULT_SUGGESTIONS: usize = 5;

/// Erro se `extra_kg` não couber no local.
pub fn check_capacity(location: &Location, extra_kg: Decimal) -> Result<(), AppError> {
    let requested = location.current_weight_kg + extra_kg;
    if requested > location.max_capacity_kg {
        return Err(AppError::CapacityExceeded {
            code: location.code.clone(),
            max_capacity_kg: location.max_capacity_kg,
            requested_kg: requested,
        });
    }
    Ok(())
}

/// Um local ocupado só aceita o próprio produto que já está nele.
pub fn ensure_free_for(location: &Location, current_location_of_product: Option<Uuid>) -> Result<(), AppError> {
    if location.is_occupied && current_location_of_product != Some(location.id) {
        return Err(AppError::LocationOccupied(location.code.clone()));
    }
    Ok(())
}

/// Novo peso do local após somar `delta_kg` (negativo = saída). Nunca fica abaixo de zero.
pub fn apply_delta(location: &Location, delta_kg: Decimal) -> Result<Decimal, AppError> {
    if delta_kg > Decimal::ZERO {
        check_capacity(location, delta_kg)?;
    }
    Ok((location.current_weight_kg + delta_kg).max(Decimal::ZERO))
}

/// Ordena os candidatos pelo menor desperdício de capacidade e depois pela
/// ordem física (câmara, quadra, lado, fila, andar). Descarta os que não cabem.
pub fn rank_candidates(
    candidates: Vec<LocationWithChamber>,
    weight_kg: Decimal,
    limit: usize,
) -> Vec<LocationSuggestion> {
    let mut suggestions: Vec<LocationSuggestion> = candidates
        .into_iter()
        .filter(|c| !c.location.is_occupied && c.location.available_kg() >= weight_kg)
        .map(|c| {
            let wasted_capacity_kg = c.location.available_kg() - weight_kg;
            LocationSuggestion { location: c, wasted_capacity_kg }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        a.wasted_capacity_kg
            .cmp(&b.wasted_capacity_kg)
            .then_with(|| a.location.chamber_name.cmp(&b.location.chamber_name))
            .then_with(|| a.location.location.coordinates().cmp(&b.location.location.coordinates()))
    });
    suggestions.truncate(limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::Coordinates;
    use chrono::Utc;

    fn location(coords: (i32, i32, i32, i32), max: i64, current: i64) -> Location {
        let c = Coordinates { quadra: coords.0, lado: coords.1, fila: coords.2, andar: coords.3 };
        Location {
            id: Uuid::new_v4(),
            chamber_id: Uuid::nil(),
            quadra: c.quadra,
            lado: c.lado,
            fila: c.fila,
            andar: c.andar,
            code: c.code(),
            is_occupied: current > 0,
            max_capacity_kg: Decimal::from(max),
            current_weight_kg: Decimal::from(current),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn candidate(chamber: &str, coords: (i32, i32, i32, i32), max: i64) -> LocationWithChamber {
        LocationWithChamber { location: location(coords, max, 0), chamber_name: chamber.to_string() }
    }

    #[test]
    fn capacity_is_inclusive() {
        let loc = location((1, 1, 1, 1), 1000, 0);
        assert!(check_capacity(&loc, Decimal::from(1000)).is_ok());
        assert!(matches!(
            check_capacity(&loc, Decimal::from(1001)),
            Err(AppError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn capacity_counts_current_weight() {
        let loc = location((1, 1, 1, 1), 1000, 800);
        assert!(check_capacity(&loc, Decimal::from(200)).is_ok());
        assert!(check_capacity(&loc, Decimal::from(201)).is_err());
    }

    #[test]
    fn occupied_location_rejects_other_products() {
        let loc = location((1, 1, 1, 1), 1000, 500);
        assert!(matches!(ensure_free_for(&loc, None), Err(AppError::LocationOccupied(_))));
        assert!(matches!(ensure_free_for(&loc, Some(Uuid::new_v4())), Err(AppError::LocationOccupied(_))));
        assert!(ensure_free_for(&loc, Some(loc.id)).is_ok());

        let free = location((1, 1, 1, 2), 1000, 0);
        assert!(ensure_free_for(&free, None).is_ok());
    }

    #[test]
    fn delta_never_goes_negative_and_checks_capacity_on_growth() {
        let loc = location((1, 1, 1, 1), 1000, 300);
        assert_eq!(apply_delta(&loc, Decimal::from(-500)).unwrap(), Decimal::ZERO);
        assert_eq!(apply_delta(&loc, Decimal::from(700)).unwrap(), Decimal::from(1000));
        assert!(apply_delta(&loc, Decimal::from(701)).is_err());
    }

    #[test]
    fn ranking_prefers_least_waste_then_coordinates() {
        let candidates = vec![
            candidate("Câmara B", (1, 1, 1, 1), 1500),
            candidate("Câmara A", (2, 1, 1, 1), 1000),
            candidate("Câmara A", (1, 2, 1, 1), 1000),
            candidate("Câmara A", (1, 1, 1, 1), 500), // não cabe
            candidate("Câmara A", (1, 1, 2, 1), 1200),
        ];

        let ranked = rank_candidates(candidates, Decimal::from(900), 10);
        let codes: Vec<(String, String)> = ranked
            .iter()
            .map(|s| (s.location.chamber_name.clone(), s.location.location.code.clone()))
            .collect();

        assert_eq!(
            codes,
            vec![
                ("Câmara A".to_string(), "Q01-L02-F01-A01".to_string()),
                ("Câmara A".to_string(), "Q02-L01-F01-A01".to_string()),
                ("Câmara A".to_string(), "Q01-L01-F02-A01".to_string()),
                ("Câmara B".to_string(), "Q01-L01-F01-A01".to_string()),
            ]
        );
        assert_eq!(ranked[0].wasted_capacity_kg, Decimal::from(100));
    }

    #[test]
    fn ranking_respects_limit() {
        let candidates = (1..=10).map(|q| candidate("A", (q, 1, 1, 1), 1000)).collect();
        assert_eq!(rank_candidates(candidates, Decimal::from(10), DEFAULT_SUGGESTIONS).len(), 5);
    }
}
