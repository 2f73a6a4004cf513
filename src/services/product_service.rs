// src/services/product_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::{ChamberRepository, LocationRepository, MovementRepository, ProductRepository},
    models::{
        chamber::ChamberStatus,
        location::Location,
        movement::{MovementDetail, MovementFilter, MovementType, NewMovement},
        product::{
            measure, total_weight, MeasureError, NewProduct, Product, ProductChanges, ProductDetail, ProductFilter,
            ProductStatus,
        },
    },
    services::allocation::{apply_delta, check_capacity, ensure_free_for},
};

/// Quantidade parcial: positiva, arredondada e menor que o estoque atual.
fn partial_quantity(product: &Product, quantity: Decimal) -> Result<Decimal, AppError> {
    let quantity = measure(quantity, "Quantidade")?;
    if quantity >= product.quantity {
        return Err(AppError::BadRequest(format!(
            "Quantidade parcial ({}) deve ser menor que a quantidade atual ({}). Use a retirada total.",
            quantity, product.quantity
        )));
    }
    Ok(quantity)
}

/// Peso por unidade após somar estoque com outro peso unitário (média ponderada).
pub fn blended_unit_weight(
    current_quantity: Decimal,
    current_unit_weight: Decimal,
    added_quantity: Decimal,
    added_unit_weight: Decimal,
) -> Result<Decimal, MeasureError> {
    let quantity = current_quantity
        .checked_add(added_quantity)
        .ok_or(MeasureError::TooLarge("Quantidade"))?;
    if quantity.is_zero() {
        return measure(added_unit_weight, "Peso por unidade");
    }
    let current = current_quantity
        .checked_mul(current_unit_weight)
        .ok_or(MeasureError::TotalTooLarge)?;
    let added = added_quantity
        .checked_mul(added_unit_weight)
        .ok_or(MeasureError::TotalTooLarge)?;
    let blended = current
        .checked_add(added)
        .and_then(|total| total.checked_div(quantity))
        .ok_or(MeasureError::TotalTooLarge)?;
    measure(blended, "Peso por unidade")
}

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
    product_repo: ProductRepository,
    location_repo: LocationRepository,
    movement_repo: MovementRepository,
    chamber_repo: ChamberRepository,
}

impl ProductService {
    pub fn new(
        pool: PgPool,
        product_repo: ProductRepository,
        location_repo: LocationRepository,
        movement_repo: MovementRepository,
        chamber_repo: ChamberRepository,
    ) -> Self {
        Self { pool, product_repo, location_repo, movement_repo, chamber_repo }
    }

    // ---
    // Consultas
    // ---

    pub async fn list(&self, filter: &ProductFilter, pagination: &Pagination) -> Result<Page<ProductDetail>, AppError> {
        let (data, total) = self.product_repo.list(filter, pagination).await?;
        Ok(Page::new(data, total, pagination))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductDetail, AppError> {
        self.product_repo
            .find_detail(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Produto"))
    }

    pub async fn movements(&self, id: Uuid, pagination: &Pagination) -> Result<Page<MovementDetail>, AppError> {
        // 404 se o produto não existe
        self.get(id).await?;
        let filter = MovementFilter { product_id: Some(id), ..Default::default() };
        let (data, total) = self.movement_repo.list(&filter, pagination).await?;
        Ok(Page::new(data, total, pagination))
    }

    // ---
    // Cadastro
    // ---

    pub async fn create(&self, new: NewProduct, user_id: Uuid) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let product = self.create_in_tx(&mut tx, &new, None, Some(user_id)).await?;
        tx.commit().await?;
        self.get(product.id).await
    }

    /// Cria vários produtos com um `batch_id` novo. Tudo ou nada.
    pub async fn create_batch(&self, items: Vec<NewProduct>, user_id: Uuid) -> Result<Vec<ProductDetail>, AppError> {
        if items.is_empty() {
            return Err(AppError::BadRequest("O lote precisa de pelo menos um produto.".into()));
        }

        let batch_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let product = self
                .create_in_tx(&mut tx, item, Some(batch_id), Some(user_id))
                .await
                .map_err(|e| match e {
                    AppError::BadRequest(msg) => AppError::BadRequest(format!("Item {}: {}", index + 1, msg)),
                    other => other,
                })?;
            ids.push(product.id);
        }
        tx.commit().await?;

        tracing::info!(%batch_id, count = ids.len(), "Lote de produtos cadastrado");

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            created.push(self.get(id).await?);
        }
        Ok(created)
    }

    /// Insere o produto dentro de uma transação já aberta.
    /// Com local: LOCADO + movimentação de ENTRADA. Sem local: AGUARDANDO_LOCACAO.
    pub(crate) async fn create_in_tx(
        &self,
        conn: &mut PgConnection,
        new: &NewProduct,
        batch_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Product, AppError> {
        if new.name.trim().is_empty() || new.lot.trim().is_empty() {
            return Err(AppError::BadRequest("Nome e lote são obrigatórios.".into()));
        }
        let rounded = NewProduct {
            quantity: measure(new.quantity, "Quantidade")?,
            weight_per_unit: measure(new.weight_per_unit, "Peso por unidade")?,
            ..new.clone()
        };
        let new = &rounded;
        let weight = total_weight(new.quantity, new.weight_per_unit)?;

        let Some(location_id) = new.location_id else {
            let status = ProductStatus::Cadastrado.transition(ProductStatus::AguardandoLocacao)?;
            let product = self
                .product_repo
                .insert(&mut *conn, new, status, weight, batch_id, user_id)
                .await?;
            tracing::info!(product_id = %product.id, status = %product.status, "Produto cadastrado");
            return Ok(product);
        };

        let status = ProductStatus::Cadastrado.transition(ProductStatus::Locado)?;
        let location = self.lock_location(&mut *conn, location_id).await?;
        self.ensure_chamber_accepts(&mut *conn, &location).await?;
        ensure_free_for(&location, None)?;
        let new_weight = apply_delta(&location, weight)?;

        let product = self
            .product_repo
            .insert(&mut *conn, new, status, weight, batch_id, user_id)
            .await?;
        self.location_repo.set_weight(&mut *conn, location.id, new_weight).await?;
        self.movement_repo
            .record(
                &mut *conn,
                &NewMovement {
                    product_id: product.id,
                    movement_type: MovementType::Entrada,
                    from_location_id: None,
                    to_location_id: Some(location.id),
                    quantity: product.quantity,
                    weight,
                    user_id,
                    reason: Some("Entrada de produto"),
                    notes: None,
                },
            )
            .await?;

        tracing::info!(
            product_id = %product.id,
            location = %location.code,
            status = %product.status,
            "Produto cadastrado e alocado"
        );
        Ok(product)
    }

    /// Alteração de cadastro. Mudanças de quantidade/peso ajustam o local e geram AJUSTE.
    pub async fn update(&self, id: Uuid, changes: ProductChanges, user_id: Uuid) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;

        if let Some(expected) = changes.expected_version {
            if expected != product.version {
                return Err(AppError::VersionConflict { expected, current: product.version });
            }
        }
        if product.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Produto com status {} não pode ser alterado.",
                product.status
            )));
        }
        // Uma retirada pendente foi aberta sobre a quantidade atual
        if product.status == ProductStatus::AguardandoRetirada
            && (changes.quantity.is_some() || changes.weight_per_unit.is_some())
        {
            return Err(AppError::Conflict(
                "Produto possui retirada pendente; quantidade e peso não podem ser alterados.".into(),
            ));
        }

        let old_quantity = product.quantity;
        let old_weight = product.total_weight;

        if let Some(name) = changes.name {
            product.name = name.trim().to_string();
        }
        if let Some(lot) = changes.lot {
            product.lot = lot.trim().to_string();
        }
        if changes.seed_type_id.is_some() {
            product.seed_type_id = changes.seed_type_id;
        }
        if changes.client_id.is_some() {
            product.client_id = changes.client_id;
        }
        if let Some(quantity) = changes.quantity {
            product.quantity = measure(quantity, "Quantidade")?;
        }
        if let Some(weight_per_unit) = changes.weight_per_unit {
            product.weight_per_unit = measure(weight_per_unit, "Peso por unidade")?;
        }
        if changes.storage_type.is_some() {
            product.storage_type = changes.storage_type;
        }
        if changes.expiration_date.is_some() {
            product.expiration_date = changes.expiration_date;
        }
        if changes.notes.is_some() {
            product.notes = changes.notes;
        }
        if product.name.is_empty() || product.lot.is_empty() {
            return Err(AppError::BadRequest("Nome e lote são obrigatórios.".into()));
        }

        product.total_weight = total_weight(product.quantity, product.weight_per_unit)?;
        let delta = product.total_weight - old_weight;

        if !delta.is_zero() {
            if let Some(location_id) = product.location_id {
                let location = self.lock_location(&mut tx, location_id).await?;
                let new_weight = apply_delta(&location, delta)?;
                self.location_repo.set_weight(&mut *tx, location.id, new_weight).await?;
            }
        }

        let saved = self.save(&mut tx, &product).await?;

        if saved.quantity != old_quantity || !delta.is_zero() {
            let notes = format!(
                "Quantidade {} -> {}; peso {} kg -> {} kg",
                old_quantity, saved.quantity, old_weight, saved.total_weight
            );
            self.movement_repo
                .record(
                    &mut *tx,
                    &NewMovement {
                        product_id: saved.id,
                        movement_type: MovementType::Ajuste,
                        from_location_id: saved.location_id,
                        to_location_id: saved.location_id,
                        quantity: (saved.quantity - old_quantity).abs(),
                        weight: delta.abs(),
                        user_id: Some(user_id),
                        reason: Some("Ajuste de cadastro"),
                        notes: Some(&notes),
                    },
                )
                .await?;
        }

        tx.commit().await?;
        tracing::info!(product_id = %saved.id, version = saved.version, "Produto atualizado");
        self.get(saved.id).await
    }

    /// Baixa administrativa: REMOVIDO, libera o local e registra SAIDA.
    pub async fn remove(&self, id: Uuid, reason: Option<&str>, user_id: Uuid) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;
        let previous = product.status;
        product.status = product.status.transition(ProductStatus::Removido)?;

        let from_location_id = product.location_id.take();
        if let Some(location_id) = from_location_id {
            let location = self.lock_location(&mut tx, location_id).await?;
            let new_weight = apply_delta(&location, -product.total_weight)?;
            self.location_repo.set_weight(&mut *tx, location.id, new_weight).await?;
        }

        let saved = self.save(&mut tx, &product).await?;
        self.movement_repo
            .record(
                &mut *tx,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Saida,
                    from_location_id,
                    to_location_id: None,
                    quantity: saved.quantity,
                    weight: saved.total_weight,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Remoção do produto")),
                    notes: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(product_id = %saved.id, from = %previous, to = %saved.status, "Produto removido");
        self.get(saved.id).await
    }

    // ---
    // Alocação e movimentação
    // ---

    /// Aloca um produto sem local (CADASTRADO / AGUARDANDO_LOCACAO) → LOCADO.
    pub async fn allocate(&self, id: Uuid, location_id: Uuid, user_id: Uuid) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;

        if product.location_id.is_some() {
            return Err(AppError::BadRequest(
                "Produto já está alocado. Use a movimentação para trocar de local.".into(),
            ));
        }
        let previous = product.status;
        product.status = product.status.transition(ProductStatus::Locado)?;

        let location = self.lock_location(&mut tx, location_id).await?;
        self.ensure_chamber_accepts(&mut tx, &location).await?;
        ensure_free_for(&location, None)?;
        let new_weight = apply_delta(&location, product.total_weight)?;

        self.location_repo.set_weight(&mut *tx, location.id, new_weight).await?;
        product.location_id = Some(location.id);
        let saved = self.save(&mut tx, &product).await?;

        self.movement_repo
            .record(
                &mut *tx,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Entrada,
                    from_location_id: None,
                    to_location_id: Some(location.id),
                    quantity: saved.quantity,
                    weight: saved.total_weight,
                    user_id: Some(user_id),
                    reason: Some("Alocação de produto"),
                    notes: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %saved.id,
            location = %location.code,
            from = %previous,
            to = %saved.status,
            "Produto alocado"
        );
        self.get(saved.id).await
    }

    /// Move o produto inteiro para outro local (TRANSFERENCIA).
    pub async fn move_product(
        &self,
        id: Uuid,
        new_location_id: Uuid,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;
        let current_location_id = Self::movable_location(&product)?;

        if current_location_id == new_location_id {
            return Err(AppError::BadRequest("O novo local é igual ao local atual.".into()));
        }
        product.status = product.status.transition(ProductStatus::Locado)?;

        let (from, to) = self.lock_pair(&mut tx, current_location_id, new_location_id).await?;
        self.ensure_chamber_accepts(&mut tx, &to).await?;
        ensure_free_for(&to, product.location_id)?;
        let to_weight = apply_delta(&to, product.total_weight)?;
        let from_weight = apply_delta(&from, -product.total_weight)?;

        self.location_repo.set_weight(&mut *tx, from.id, from_weight).await?;
        self.location_repo.set_weight(&mut *tx, to.id, to_weight).await?;
        product.location_id = Some(to.id);
        let saved = self.save(&mut tx, &product).await?;

        self.movement_repo
            .record(
                &mut *tx,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Transferencia,
                    from_location_id: Some(from.id),
                    to_location_id: Some(to.id),
                    quantity: saved.quantity,
                    weight: saved.total_weight,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Movimentação entre locais")),
                    notes: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(product_id = %saved.id, from = %from.code, to = %to.code, "Produto movimentado");
        self.get(saved.id).await
    }

    /// Saída de parte do estoque; o produto continua LOCADO.
    pub async fn partial_exit(
        &self,
        id: Uuid,
        quantity: Decimal,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;
        let location_id = Self::movable_location(&product)?;
        let quantity = partial_quantity(&product, quantity)?;

        let exited = self
            .reduce_stock(&mut tx, &mut product, location_id, quantity)
            .await?;
        let saved = self.save(&mut tx, &product).await?;

        self.movement_repo
            .record(
                &mut *tx,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Saida,
                    from_location_id: Some(location_id),
                    to_location_id: None,
                    quantity,
                    weight: exited,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Saída parcial")),
                    notes: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(product_id = %saved.id, %quantity, remaining = %saved.quantity, "Saída parcial registrada");
        self.get(saved.id).await
    }

    /// Divide o produto: `quantity` vai para um novo produto (mesmo lote) em outro local.
    /// Devolve o produto novo.
    pub async fn partial_move(
        &self,
        id: Uuid,
        quantity: Decimal,
        new_location_id: Uuid,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<ProductDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;
        let current_location_id = Self::movable_location(&product)?;
        let quantity = partial_quantity(&product, quantity)?;

        if current_location_id == new_location_id {
            return Err(AppError::BadRequest("O novo local é igual ao local atual.".into()));
        }

        let (from, to) = self.lock_pair(&mut tx, current_location_id, new_location_id).await?;
        self.ensure_chamber_accepts(&mut tx, &to).await?;
        ensure_free_for(&to, None)?;
        let moved_weight = total_weight(quantity, product.weight_per_unit)?;
        check_capacity(&to, moved_weight)?;

        self.reduce_stock(&mut tx, &mut product, from.id, quantity).await?;
        let source = self.save(&mut tx, &product).await?;

        let split = NewProduct {
            name: source.name.clone(),
            lot: source.lot.clone(),
            seed_type_id: source.seed_type_id,
            client_id: source.client_id,
            location_id: Some(to.id),
            quantity,
            weight_per_unit: source.weight_per_unit,
            storage_type: source.storage_type.clone(),
            entry_date: Some(source.entry_date),
            expiration_date: source.expiration_date,
            notes: source.notes.clone(),
        };
        let status = ProductStatus::Cadastrado.transition(ProductStatus::Locado)?;
        let created = self
            .product_repo
            .insert(&mut *tx, &split, status, moved_weight, source.batch_id, Some(user_id))
            .await?;
        let to_weight = apply_delta(&to, created.total_weight)?;
        self.location_repo.set_weight(&mut *tx, to.id, to_weight).await?;

        let reason = reason.unwrap_or("Movimentação parcial");
        let notes = format!("Dividido do produto {}", source.id);
        for (product_id, notes) in [(source.id, None), (created.id, Some(notes.as_str()))] {
            self.movement_repo
                .record(
                    &mut *tx,
                    &NewMovement {
                        product_id,
                        movement_type: MovementType::Transferencia,
                        from_location_id: Some(from.id),
                        to_location_id: Some(to.id),
                        quantity,
                        weight: created.total_weight,
                        user_id: Some(user_id),
                        reason: Some(reason),
                        notes,
                    },
                )
                .await?;
        }
        tx.commit().await?;

        tracing::info!(
            source_id = %source.id,
            new_product_id = %created.id,
            from = %from.code,
            to = %to.code,
            %quantity,
            "Movimentação parcial"
        );
        self.get(created.id).await
    }

    /// Entrada de estoque adicional no mesmo produto.
    pub async fn add_stock(
        &self,
        id: Uuid,
        quantity: Decimal,
        weight_per_unit: Option<Decimal>,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<ProductDetail, AppError> {
        let quantity = measure(quantity, "Quantidade")?;
        let weight_per_unit = weight_per_unit.map(|w| measure(w, "Peso por unidade")).transpose()?;

        let mut tx = self.pool.begin().await?;
        let mut product = self.lock_product(&mut tx, id).await?;
        if product.status.is_terminal() || product.status == ProductStatus::AguardandoRetirada {
            return Err(AppError::Conflict(format!(
                "Não é possível adicionar estoque a um produto com status {}.",
                product.status
            )));
        }

        let old_weight = product.total_weight;
        let added_unit_weight = weight_per_unit.unwrap_or(product.weight_per_unit);
        product.weight_per_unit =
            blended_unit_weight(product.quantity, product.weight_per_unit, quantity, added_unit_weight)?;
        product.quantity = measure(product.quantity + quantity, "Quantidade")?;
        product.total_weight = total_weight(product.quantity, product.weight_per_unit)?;
        let delta = product.total_weight - old_weight;

        if let Some(location_id) = product.location_id {
            let location = self.lock_location(&mut tx, location_id).await?;
            let new_weight = apply_delta(&location, delta)?;
            self.location_repo.set_weight(&mut *tx, location.id, new_weight).await?;
        }

        let saved = self.save(&mut tx, &product).await?;
        self.movement_repo
            .record(
                &mut *tx,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Entrada,
                    from_location_id: None,
                    to_location_id: saved.location_id,
                    quantity,
                    weight: delta,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Entrada de estoque")),
                    notes: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(product_id = %saved.id, %quantity, total = %saved.quantity, "Estoque adicionado");
        self.get(saved.id).await
    }

    // ---
    // Retirada (chamados pelo fluxo de solicitações, dentro da transação dele)
    // ---

    /// LOCADO → AGUARDANDO_RETIRADA.
    pub(crate) async fn mark_awaiting_withdrawal(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<Product, AppError> {
        let mut product = self.lock_product(conn, product_id).await?;
        let previous = product.status;
        product.status = product.status.transition(ProductStatus::AguardandoRetirada)?;
        let saved = self.save(conn, &product).await?;
        tracing::info!(product_id = %saved.id, from = %previous, to = %saved.status, "Produto aguardando retirada");
        Ok(saved)
    }

    /// AGUARDANDO_RETIRADA → LOCADO (solicitação cancelada).
    pub(crate) async fn release_withdrawal(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<Product, AppError> {
        let mut product = self.lock_product(conn, product_id).await?;
        Self::ensure_awaiting(&product)?;
        product.status = product.status.transition(ProductStatus::Locado)?;
        let saved = self.save(conn, &product).await?;
        tracing::info!(product_id = %saved.id, to = %saved.status, "Retirada cancelada, produto de volta ao local");
        Ok(saved)
    }

    /// Retirada total: RETIRADO, local liberado, SAIDA.
    pub(crate) async fn complete_total_withdrawal(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<Product, AppError> {
        let mut product = self.lock_product(conn, product_id).await?;
        Self::ensure_awaiting(&product)?;
        product.status = product.status.transition(ProductStatus::Retirado)?;

        let from_location_id = product.location_id.take();
        if let Some(location_id) = from_location_id {
            let location = self.lock_location(conn, location_id).await?;
            let new_weight = apply_delta(&location, -product.total_weight)?;
            self.location_repo.set_weight(&mut *conn, location.id, new_weight).await?;
        }

        let saved = self.save(conn, &product).await?;
        self.movement_repo
            .record(
                &mut *conn,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Saida,
                    from_location_id,
                    to_location_id: None,
                    quantity: saved.quantity,
                    weight: saved.total_weight,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Retirada total")),
                    notes: None,
                },
            )
            .await?;

        tracing::info!(product_id = %saved.id, to = %saved.status, "Retirada total concluída");
        Ok(saved)
    }

    /// Retirada parcial: reduz a quantidade e o produto volta a LOCADO.
    pub(crate) async fn complete_partial_withdrawal(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        quantity: Decimal,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<Product, AppError> {
        let mut product = self.lock_product(conn, product_id).await?;
        Self::ensure_awaiting(&product)?;
        let quantity = partial_quantity(&product, quantity)?;
        product.status = product.status.transition(ProductStatus::Locado)?;

        let location_id = product
            .location_id
            .ok_or_else(|| AppError::Conflict("Produto aguardando retirada sem local.".into()))?;
        let exited = self.reduce_stock(conn, &mut product, location_id, quantity).await?;
        let saved = self.save(conn, &product).await?;

        self.movement_repo
            .record(
                &mut *conn,
                &NewMovement {
                    product_id: saved.id,
                    movement_type: MovementType::Saida,
                    from_location_id: Some(location_id),
                    to_location_id: None,
                    quantity,
                    weight: exited,
                    user_id: Some(user_id),
                    reason: Some(reason.unwrap_or("Retirada parcial")),
                    notes: None,
                },
            )
            .await?;

        tracing::info!(product_id = %saved.id, %quantity, remaining = %saved.quantity, "Retirada parcial concluída");
        Ok(saved)
    }

    // ---
    // Auxiliares
    // ---

    async fn lock_product(&self, conn: &mut PgConnection, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_for_update(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound("Produto"))
    }

    async fn lock_location(&self, conn: &mut PgConnection, id: Uuid) -> Result<Location, AppError> {
        self.location_repo
            .find_for_update(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound("Local"))
    }

    /// Trava dois locais sempre na mesma ordem (por id) e devolve (a, b).
    async fn lock_pair(&self, conn: &mut PgConnection, a: Uuid, b: Uuid) -> Result<(Location, Location), AppError> {
        if a < b {
            let first = self.lock_location(conn, a).await?;
            let second = self.lock_location(conn, b).await?;
            Ok((first, second))
        } else {
            let second = self.lock_location(conn, b).await?;
            let first = self.lock_location(conn, a).await?;
            Ok((first, second))
        }
    }

    /// Câmaras inativas não recebem produtos.
    async fn ensure_chamber_accepts(&self, conn: &mut PgConnection, location: &Location) -> Result<(), AppError> {
        let chamber = self
            .chamber_repo
            .find_by_id(&mut *conn, location.chamber_id)
            .await?
            .ok_or(AppError::NotFound("Câmara"))?;
        if chamber.status == ChamberStatus::Inactive {
            return Err(AppError::BadRequest(format!(
                "A câmara {} está inativa e não recebe produtos.",
                chamber.name
            )));
        }
        Ok(())
    }

    /// Local atual de um produto que pode ser movimentado (LOCADO).
    fn movable_location(product: &Product) -> Result<Uuid, AppError> {
        match (product.status, product.location_id) {
            (ProductStatus::Locado, Some(location_id)) => Ok(location_id),
            (ProductStatus::AguardandoRetirada, _) => Err(AppError::Conflict(
                "Produto possui retirada pendente e não pode ser movimentado.".into(),
            )),
            (status, _) => Err(AppError::BadRequest(format!(
                "Produto com status {} não está alocado.",
                status
            ))),
        }
    }

    fn ensure_awaiting(product: &Product) -> Result<(), AppError> {
        if product.status != ProductStatus::AguardandoRetirada {
            return Err(AppError::Conflict(format!(
                "Produto com status {} não está aguardando retirada.",
                product.status
            )));
        }
        Ok(())
    }

    /// Reduz a quantidade e o peso do local. Devolve o peso que saiu.
    async fn reduce_stock(
        &self,
        conn: &mut PgConnection,
        product: &mut Product,
        location_id: Uuid,
        quantity: Decimal,
    ) -> Result<Decimal, AppError> {
        let old_weight = product.total_weight;
        product.quantity -= quantity;
        // A parte que fica também precisa de peso
        product.total_weight = total_weight(product.quantity, product.weight_per_unit)?;
        let exited = old_weight - product.total_weight;

        let location = self.lock_location(conn, location_id).await?;
        let new_weight = apply_delta(&location, -exited)?;
        self.location_repo.set_weight(&mut *conn, location.id, new_weight).await?;
        Ok(exited)
    }

    async fn save(&self, conn: &mut PgConnection, product: &Product) -> Result<Product, AppError> {
        self.product_repo
            .save(&mut *conn, product)
            .await?
            .ok_or(AppError::VersionConflict { expected: product.version, current: product.version + 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blended_weight_is_weighted_average() {
        // 10 × 20 kg + 30 × 40 kg = 1400 kg em 40 unidades
        let w = blended_unit_weight(Decimal::from(10), Decimal::from(20), Decimal::from(30), Decimal::from(40));
        assert_eq!(w, Ok(Decimal::from(35)));
    }

    #[test]
    fn blended_weight_keeps_same_unit_weight() {
        let w = blended_unit_weight(Decimal::from(7), Decimal::new(255, 1), Decimal::from(3), Decimal::new(255, 1));
        assert_eq!(w, Ok(Decimal::new(255, 1)));
    }

    #[test]
    fn blended_weight_rejects_overflow() {
        let huge = Decimal::MAX;
        assert!(blended_unit_weight(huge, huge, Decimal::ONE, Decimal::ONE).is_err());
        assert!(blended_unit_weight(Decimal::ONE, Decimal::ONE, huge, Decimal::ONE).is_err());
    }

    #[test]
    fn partial_quantity_must_be_below_current() {
        let product = sample_product(Decimal::from(10));
        assert_eq!(partial_quantity(&product, Decimal::from(3)).unwrap(), Decimal::from(3));
        assert_eq!(partial_quantity(&product, Decimal::new(25004, 4)).unwrap(), Decimal::new(25, 1));
        assert!(partial_quantity(&product, Decimal::from(10)).is_err());
        assert!(partial_quantity(&product, Decimal::ZERO).is_err());
        assert!(partial_quantity(&product, Decimal::from(-1)).is_err());
    }

    #[test]
    fn only_located_products_can_move() {
        let mut product = sample_product(Decimal::from(10));
        assert!(matches!(ProductService::movable_location(&product), Err(AppError::BadRequest(_))));

        let location_id = Uuid::new_v4();
        product.status = ProductStatus::Locado;
        product.location_id = Some(location_id);
        assert_eq!(ProductService::movable_location(&product).unwrap(), location_id);

        product.status = ProductStatus::AguardandoRetirada;
        assert!(matches!(ProductService::movable_location(&product), Err(AppError::Conflict(_))));
    }

    fn sample_product(quantity: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Soja".into(),
            lot: "L-01".into(),
            seed_type_id: None,
            client_id: None,
            location_id: None,
            batch_id: None,
            quantity,
            weight_per_unit: Decimal::from(25),
            total_weight: quantity * Decimal::from(25),
            status: ProductStatus::AguardandoLocacao,
            storage_type: None,
            entry_date: chrono::Utc::now().date_naive(),
            expiration_date: None,
            notes: None,
            version: 1,
            created_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}
