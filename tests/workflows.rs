// Fluxos de estoque sobre um banco real. `#[sqlx::test]` cria um banco
// isolado por teste (a partir de DATABASE_URL) e aplica ./migrations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use seed_storage::{
    common::{error::AppError, pagination::Pagination},
    config::{AppState, Config},
    models::{
        auth::UserRole,
        chamber::{ChamberStatus, ChamberWithStats, CreateChamberPayload, UpdateChamberPayload},
        location::Location,
        movement::MovementType,
        product::{NewProduct, ProductChanges, ProductStatus},
        withdrawal::{WithdrawalKind, WithdrawalStatus},
    },
};

struct Fixture {
    state: AppState,
    user_id: Uuid,
    chamber: ChamberWithStats,
    locations: Vec<Location>,
}

async fn fixture(pool: PgPool) -> Fixture {
    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://ignorado".to_string()),
        "JWT_SECRET" => Some("segredo-de-teste".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::from_pool(pool, config);

    let user = state
        .user_service
        .create("Admin", "admin@sementes.test", "senha-forte", UserRole::Admin)
        .await
        .unwrap();

    // 2 quadras x 1 lado x 1 fila x 2 andares, 1000 kg por local
    let chamber = state
        .chamber_service
        .create(CreateChamberPayload {
            name: "Câmara 01".into(),
            description: None,
            quadras: 2,
            lados: 1,
            filas: 1,
            andares: 2,
            target_temperature: None,
            target_humidity: None,
            status: Some(ChamberStatus::Active),
            default_location_capacity_kg: Some(Decimal::from(1000)),
        })
        .await
        .unwrap();
    let locations = state.chamber_service.locations(chamber.chamber.id).await.unwrap();
    assert_eq!(locations.len(), 4);

    Fixture { state, user_id: user.id, chamber, locations }
}

fn soja(quantity: Decimal, weight_per_unit: Decimal, location_id: Option<Uuid>) -> NewProduct {
    NewProduct {
        name: "Soja BRS 284".into(),
        lot: "L-2026-01".into(),
        seed_type_id: None,
        client_id: None,
        location_id,
        quantity,
        weight_per_unit,
        storage_type: None,
        entry_date: None,
        expiration_date: None,
        notes: None,
    }
}

impl Fixture {
    async fn location(&self, id: Uuid) -> Location {
        self.state.location_service.find(id).await.unwrap().location
    }

    async fn movement_types(&self, product_id: Uuid) -> Vec<MovementType> {
        self.state
            .product_service
            .movements(product_id, &Pagination::default())
            .await
            .unwrap()
            .data
            .into_iter()
            .map(|m| m.movement.movement_type)
            .collect()
    }
}

#[sqlx::test]
async fn product_with_location_is_stored_and_weighed(pool: PgPool) {
    let f = fixture(pool).await;
    let target = f.locations[0].id;

    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(target)), f.user_id)
        .await
        .unwrap();

    assert_eq!(product.product.status, ProductStatus::Locado);
    assert_eq!(product.product.total_weight, Decimal::from(250));
    let location = f.location(target).await;
    assert!(location.is_occupied);
    assert_eq!(location.current_weight_kg, Decimal::from(250));
    assert_eq!(f.movement_types(product.product.id).await, vec![MovementType::Entrada]);
}

#[sqlx::test]
async fn allocating_onto_occupied_location_conflicts(pool: PgPool) {
    let f = fixture(pool).await;
    let target = f.locations[0].id;
    let service = &f.state.product_service;

    service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(target)), f.user_id)
        .await
        .unwrap();
    let waiting = service
        .create(soja(Decimal::from(2), Decimal::from(25), None), f.user_id)
        .await
        .unwrap();
    assert_eq!(waiting.product.status, ProductStatus::AguardandoLocacao);

    let err = service.allocate(waiting.product.id, target, f.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::LocationOccupied(_)), "{err:?}");

    let still_waiting = service.get(waiting.product.id).await.unwrap();
    assert_eq!(still_waiting.product.status, ProductStatus::AguardandoLocacao);
    assert_eq!(f.location(target).await.current_weight_kg, Decimal::from(250));
}

#[sqlx::test]
async fn allocation_beyond_capacity_is_refused(pool: PgPool) {
    let f = fixture(pool).await;
    let waiting = f
        .state
        .product_service
        .create(soja(Decimal::from(50), Decimal::from(25), None), f.user_id)
        .await
        .unwrap();

    let err = f
        .state
        .product_service
        .allocate(waiting.product.id, f.locations[0].id, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }), "{err:?}");
}

#[sqlx::test]
async fn partial_move_splits_weight_between_locations(pool: PgPool) {
    let f = fixture(pool).await;
    let (from, to) = (f.locations[0].id, f.locations[1].id);
    let service = &f.state.product_service;

    let source = service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(from)), f.user_id)
        .await
        .unwrap();
    let split = service
        .partial_move(source.product.id, Decimal::from(4), to, Some("Reorganização"), f.user_id)
        .await
        .unwrap();

    assert_eq!(split.product.status, ProductStatus::Locado);
    assert_eq!(split.product.location_id, Some(to));
    assert_eq!(split.product.lot, source.product.lot);
    assert_eq!(split.product.quantity, Decimal::from(4));
    assert_eq!(split.product.total_weight, Decimal::from(100));

    let source = service.get(source.product.id).await.unwrap();
    assert_eq!(source.product.quantity, Decimal::from(6));
    assert_eq!(source.product.total_weight, Decimal::from(150));

    assert_eq!(f.location(from).await.current_weight_kg, Decimal::from(150));
    let to_location = f.location(to).await;
    assert!(to_location.is_occupied);
    assert_eq!(to_location.current_weight_kg, Decimal::from(100));

    assert!(f.movement_types(source.product.id).await.contains(&MovementType::Transferencia));
    assert_eq!(f.movement_types(split.product.id).await, vec![MovementType::Transferencia]);
}

#[sqlx::test]
async fn total_withdrawal_frees_the_location(pool: PgPool) {
    let f = fixture(pool).await;
    let target = f.locations[0].id;

    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(target)), f.user_id)
        .await
        .unwrap();
    let request = f
        .state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Total, None, Some("Venda"), f.user_id)
        .await
        .unwrap();
    let awaiting = f.state.product_service.get(product.product.id).await.unwrap();
    assert_eq!(awaiting.product.status, ProductStatus::AguardandoRetirada);

    let done = f.state.withdrawal_service.confirm(request.request.id, f.user_id).await.unwrap();
    assert_eq!(done.request.status, WithdrawalStatus::Concluida);

    let withdrawn = f.state.product_service.get(product.product.id).await.unwrap();
    assert_eq!(withdrawn.product.status, ProductStatus::Retirado);
    assert_eq!(withdrawn.product.location_id, None);
    let location = f.location(target).await;
    assert!(!location.is_occupied);
    assert_eq!(location.current_weight_kg, Decimal::ZERO);

    // Só solicitações pendentes podem ser confirmadas
    let err = f.state.withdrawal_service.confirm(request.request.id, f.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
}

#[sqlx::test]
async fn partial_withdrawal_returns_product_to_located(pool: PgPool) {
    let f = fixture(pool).await;
    let target = f.locations[0].id;

    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(target)), f.user_id)
        .await
        .unwrap();
    let request = f
        .state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Parcial, Some(Decimal::from(3)), None, f.user_id)
        .await
        .unwrap();

    // Segunda solicitação para o mesmo produto
    let err = f
        .state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Total, None, None, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    f.state.withdrawal_service.confirm(request.request.id, f.user_id).await.unwrap();

    let remaining = f.state.product_service.get(product.product.id).await.unwrap();
    assert_eq!(remaining.product.status, ProductStatus::Locado);
    assert_eq!(remaining.product.quantity, Decimal::from(7));
    assert_eq!(remaining.product.total_weight, Decimal::from(175));
    assert_eq!(f.location(target).await.current_weight_kg, Decimal::from(175));
    assert_eq!(
        f.movement_types(product.product.id).await.iter().filter(|t| **t == MovementType::Saida).count(),
        1
    );
}

#[sqlx::test]
async fn cancelled_withdrawal_keeps_stock(pool: PgPool) {
    let f = fixture(pool).await;
    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(f.locations[0].id)), f.user_id)
        .await
        .unwrap();
    let request = f
        .state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Total, None, None, f.user_id)
        .await
        .unwrap();

    let cancelled = f.state.withdrawal_service.cancel(request.request.id, f.user_id).await.unwrap();
    assert_eq!(cancelled.request.status, WithdrawalStatus::Cancelada);
    let product = f.state.product_service.get(product.product.id).await.unwrap();
    assert_eq!(product.product.status, ProductStatus::Locado);
    assert_eq!(product.product.quantity, Decimal::from(10));
}

#[sqlx::test]
async fn quantity_is_locked_while_withdrawal_is_pending(pool: PgPool) {
    let f = fixture(pool).await;
    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(f.locations[0].id)), f.user_id)
        .await
        .unwrap();
    f.state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Parcial, Some(Decimal::from(8)), None, f.user_id)
        .await
        .unwrap();

    let changes = ProductChanges { quantity: Some(Decimal::from(5)), ..Default::default() };
    let err = f
        .state
        .product_service
        .update(product.product.id, changes, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // Metadados continuam editáveis
    let changes = ProductChanges { notes: Some("Conferido".into()), ..Default::default() };
    let updated = f.state.product_service.update(product.product.id, changes, f.user_id).await.unwrap();
    assert_eq!(updated.product.quantity, Decimal::from(10));
}

#[sqlx::test]
async fn shrinking_over_an_occupied_location_is_refused(pool: PgPool) {
    let f = fixture(pool).await;
    let chamber_id = f.chamber.chamber.id;
    // Q02-L01-F01-A02 fica fora de uma câmara com 1 quadra
    let outside = f.locations.iter().find(|l| l.quadra == 2).unwrap().id;
    f.state
        .product_service
        .create(soja(Decimal::from(1), Decimal::from(25), Some(outside)), f.user_id)
        .await
        .unwrap();

    let shrink = || UpdateChamberPayload {
        name: None,
        description: None,
        quadras: Some(1),
        lados: None,
        filas: None,
        andares: None,
        target_temperature: None,
        target_humidity: None,
        status: None,
        default_location_capacity_kg: None,
    };
    let err = f.state.chamber_service.update(chamber_id, shrink()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
    assert_eq!(f.state.chamber_service.locations(chamber_id).await.unwrap().len(), 4);

    let err = f.state.chamber_service.delete(chamber_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
}

#[sqlx::test]
async fn stale_expected_version_conflicts(pool: PgPool) {
    let f = fixture(pool).await;
    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(f.locations[0].id)), f.user_id)
        .await
        .unwrap();
    let version = product.product.version;

    let changes = ProductChanges {
        quantity: Some(Decimal::from(12)),
        expected_version: Some(version),
        ..Default::default()
    };
    let updated = f.state.product_service.update(product.product.id, changes, f.user_id).await.unwrap();
    assert_eq!(updated.product.version, version + 1);
    assert_eq!(updated.product.total_weight, Decimal::from(300));
    assert_eq!(f.location(f.locations[0].id).await.current_weight_kg, Decimal::from(300));

    let changes = ProductChanges { name: Some("Soja".into()), expected_version: Some(version), ..Default::default() };
    let err = f.state.product_service.update(product.product.id, changes, f.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::VersionConflict { .. }), "{err:?}");
}

#[sqlx::test]
async fn out_of_range_quantities_are_bad_requests(pool: PgPool) {
    let f = fixture(pool).await;
    let huge = Decimal::from_str_exact("100000000000000000000").unwrap();

    let err = f
        .state
        .product_service
        .create(soja(huge, huge, None), f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");

    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), None), f.user_id)
        .await
        .unwrap();
    let err = f
        .state
        .product_service
        .add_stock(product.product.id, huge, None, None, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
}

#[sqlx::test]
async fn stored_total_matches_stored_factors(pool: PgPool) {
    let f = fixture(pool).await;
    // Peso vindo de uma fórmula (=25/3)
    let unit = Decimal::from_str_exact("8.333333333333334").unwrap();
    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(30), unit, Some(f.locations[0].id)), f.user_id)
        .await
        .unwrap();

    let p = &product.product;
    assert_eq!(p.weight_per_unit, Decimal::new(8333, 3));
    assert_eq!(p.total_weight, p.quantity * p.weight_per_unit);
    assert_eq!(f.location(f.locations[0].id).await.current_weight_kg, p.total_weight);
}

#[sqlx::test]
async fn weightless_products_are_rejected(pool: PgPool) {
    let f = fixture(pool).await;
    let tiny = Decimal::new(1, 3);
    let target = f.locations[0].id;

    let err = f
        .state
        .product_service
        .create(soja(tiny, tiny, Some(target)), f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert!(!f.location(target).await.is_occupied);

    // Uma divisão não pode deixar uma das partes sem peso
    let product = f
        .state
        .product_service
        .create(soja(Decimal::new(1001, 3), Decimal::ONE, Some(target)), f.user_id)
        .await
        .unwrap();
    let moved = f
        .state
        .product_service
        .partial_move(product.product.id, Decimal::ONE, f.locations[1].id, None, f.user_id)
        .await;
    assert!(moved.is_ok(), "{moved:?}");
    let source = f.state.product_service.get(product.product.id).await.unwrap();
    assert!(source.product.total_weight > Decimal::ZERO);

    let small = f
        .state
        .product_service
        .create(soja(Decimal::from(2), Decimal::new(1, 3), Some(f.locations[2].id)), f.user_id)
        .await
        .unwrap();
    let err = f
        .state
        .product_service
        .partial_exit(small.product.id, Decimal::new(1999, 3), None, f.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
}

#[sqlx::test]
async fn dashboard_summary_reads_one_snapshot(pool: PgPool) {
    let f = fixture(pool).await;
    let product = f
        .state
        .product_service
        .create(soja(Decimal::from(10), Decimal::from(25), Some(f.locations[0].id)), f.user_id)
        .await
        .unwrap();
    f.state
        .withdrawal_service
        .create(product.product.id, WithdrawalKind::Total, None, None, f.user_id)
        .await
        .unwrap();

    let summary = f.state.dashboard_service.get_summary().await.unwrap();
    assert_eq!(summary.total_chambers, 1);
    assert_eq!(summary.total_locations, 4);
    assert_eq!(summary.occupied_locations, 1);
    assert_eq!(summary.free_locations, 3);
    assert_eq!(summary.total_weight_kg, Decimal::from(250));
    assert_eq!(summary.pending_withdrawals, 1);
    assert_eq!(summary.movements_today, 1);
}
