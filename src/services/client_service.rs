// src/services/client_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::{client_repo::ClientFields, ClientRepository, ProductRepository},
    models::{
        client::{normalize_document, Client, ClientPayload},
        product::{ProductDetail, ProductFilter},
    },
};

/// Resultado da exclusão: clientes com histórico são apenas desativados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRemoval {
    Deleted,
    Deactivated,
}

#[derive(Clone)]
pub struct ClientService {
    pool: PgPool,
    repo: ClientRepository,
    product_repo: ProductRepository,
}

impl ClientService {
    pub fn new(pool: PgPool, repo: ClientRepository, product_repo: ProductRepository) -> Self {
        Self { pool, repo, product_repo }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        self.repo.list(search.filter(|s| !s.trim().is_empty())).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Cliente"))
    }

    pub async fn products(&self, id: Uuid, pagination: &Pagination) -> Result<Page<ProductDetail>, AppError> {
        self.get(id).await?;
        let filter = ProductFilter { client_id: Some(id), ..Default::default() };
        let (data, total) = self.product_repo.list(&filter, pagination).await?;
        Ok(Page::new(data, total, pagination))
    }

    pub async fn create(&self, payload: &ClientPayload) -> Result<Client, AppError> {
        let document = normalize_document(payload.document.as_deref());
        let client = self
            .repo
            .create(
                &self.pool,
                &ClientFields {
                    name: &payload.name,
                    document: document.as_deref(),
                    email: payload.email.as_deref(),
                    phone: payload.phone.as_deref(),
                    address: payload.address.as_deref(),
                    is_active: payload.is_active.unwrap_or(true),
                },
            )
            .await?;
        tracing::info!(client_id = %client.id, "Cliente criado");
        Ok(client)
    }

    pub async fn update(&self, id: Uuid, payload: &ClientPayload) -> Result<Client, AppError> {
        let document = normalize_document(payload.document.as_deref());
        self.repo
            .update(
                id,
                &ClientFields {
                    name: &payload.name,
                    document: document.as_deref(),
                    email: payload.email.as_deref(),
                    phone: payload.phone.as_deref(),
                    address: payload.address.as_deref(),
                    is_active: payload.is_active.unwrap_or(true),
                },
            )
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    /// Cliente com produto em estoque não sai. Com histórico, é desativado.
    pub async fn delete(&self, id: Uuid) -> Result<ClientRemoval, AppError> {
        let client = self.get(id).await?;

        let in_stock = self.repo.count_products(id, true).await?;
        if in_stock > 0 {
            return Err(AppError::Conflict(format!(
                "O cliente possui {} produto(s) em estoque e não pode ser excluído.",
                in_stock
            )));
        }

        if self.repo.count_products(id, false).await? > 0 {
            self.repo
                .update(
                    id,
                    &ClientFields {
                        name: &client.name,
                        document: client.document.as_deref(),
                        email: client.email.as_deref(),
                        phone: client.phone.as_deref(),
                        address: client.address.as_deref(),
                        is_active: false,
                    },
                )
                .await?;
            tracing::info!(client_id = %id, "Cliente com histórico desativado");
            return Ok(ClientRemoval::Deactivated);
        }

        self.repo.delete(id).await?;
        tracing::info!(client_id = %id, "Cliente excluído");
        Ok(ClientRemoval::Deleted)
    }

    /// Busca o cliente pelo nome (sem diferenciar maiúsculas) ou cria um novo.
    pub(crate) async fn find_or_create(&self, conn: &mut PgConnection, name: &str) -> Result<(Client, bool), AppError> {
        if let Some(client) = self.repo.find_by_name(&mut *conn, name).await? {
            return Ok((client, false));
        }
        let client = self
            .repo
            .create(
                &mut *conn,
                &ClientFields {
                    name,
                    document: None,
                    email: None,
                    phone: None,
                    address: None,
                    is_active: true,
                },
            )
            .await?;
        Ok((client, true))
    }
}
