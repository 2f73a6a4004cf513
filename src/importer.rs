// src/importer.rs
//
// Importação de estoque a partir de planilhas (.xlsx/.xls/.ods/.csv).

pub mod header;
pub mod row;
pub mod sheet;

use std::{fmt, path::Path};

use anyhow::{anyhow, bail};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    db::{ChamberRepository, LocationRepository},
    models::{
        chamber::{Chamber, Dimensions},
        product::NewProduct,
    },
    services::{client_service::ClientService, product_service::ProductService, seed_type_service::SeedTypeService},
};

use self::{
    header::detect_header,
    row::{parse_row, ParsedRow},
    sheet::Rows,
};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Câmara onde as linhas com coordenadas serão alocadas
    pub chamber: Option<String>,
    /// Valida tudo e desfaz cada linha no final
    pub dry_run: bool,
    pub sheet: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Linha de dados com o número da linha na planilha (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub line: usize,
    pub parsed: Result<ParsedRow, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub batch_id: Uuid,
    pub dry_run: bool,
    pub rows_read: usize,
    pub imported: usize,
    pub allocated: usize,
    pub pending: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn new(batch_id: Uuid, dry_run: bool) -> Self {
        Self { batch_id, dry_run, rows_read: 0, imported: 0, allocated: 0, pending: 0, errors: Vec::new() }
    }

    fn fail(&mut self, line: usize, message: impl fmt::Display) {
        self.errors.push(format!("linha {}: {}", line, message));
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Simulação (nada foi gravado)")?;
        }
        writeln!(f, "Lote:        {}", self.batch_id)?;
        writeln!(f, "Lidas:       {}", self.rows_read)?;
        writeln!(f, "Importadas:  {}", self.imported)?;
        writeln!(f, "Alocadas:    {}", self.allocated)?;
        writeln!(f, "Pendentes:   {}", self.pending)?;
        write!(f, "Erros:       {}", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

/// Localiza o cabeçalho e converte as linhas seguintes.
/// Linhas com coordenadas exigem uma câmara.
pub fn parse_sheet(rows: &Rows, chamber_given: bool) -> anyhow::Result<Vec<SheetRow>> {
    let header = detect_header(rows).ok_or_else(|| {
        anyhow!("Cabeçalho não encontrado: as colunas Produto, Lote, Quantidade e Peso são obrigatórias")
    })?;

    let mut parsed = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(header.row_index + 1) {
        let line = index + 1;
        let result = match parse_row(&header, row) {
            Ok(None) => continue,
            Ok(Some(p)) if p.coordinates.is_some() && !chamber_given => {
                Err("coordenadas informadas sem câmara (use --chamber)".to_string())
            }
            Ok(Some(p)) => Ok(p),
            Err(e) => Err(e.to_string()),
        };
        parsed.push(SheetRow { line, parsed: result });
    }
    Ok(parsed)
}

fn user_message(error: &AppError) -> String {
    error.to_api_error().error
}

#[derive(Clone)]
pub struct Importer {
    pool: PgPool,
    product_service: ProductService,
    client_service: ClientService,
    seed_type_service: SeedTypeService,
    chamber_repo: ChamberRepository,
    location_repo: LocationRepository,
}

impl Importer {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.db_pool.clone(),
            product_service: state.product_service.clone(),
            client_service: state.client_service.clone(),
            seed_type_service: state.seed_type_service.clone(),
            chamber_repo: ChamberRepository::new(state.db_pool.clone()),
            location_repo: LocationRepository::new(state.db_pool.clone()),
        }
    }

    pub async fn import_file(&self, path: &Path, options: &ImportOptions) -> anyhow::Result<ImportReport> {
        let rows = sheet::read_rows(path, options.sheet.as_deref())?;
        tracing::info!(file = %path.display(), rows = rows.len(), "Planilha lida");
        self.import_rows(&rows, options).await
    }

    /// Cada linha vai em sua própria transação; erros são coletados e a importação segue.
    pub async fn import_rows(&self, rows: &Rows, options: &ImportOptions) -> anyhow::Result<ImportReport> {
        let chamber = match options.chamber.as_deref() {
            Some(name) => match self.chamber_repo.find_by_name(&self.pool, name).await? {
                Some(chamber) => Some(chamber),
                None => bail!("Câmara '{}' não encontrada", name),
            },
            None => None,
        };

        let sheet_rows = parse_sheet(rows, chamber.is_some())?;
        let mut report = ImportReport::new(Uuid::new_v4(), options.dry_run);

        for sheet_row in sheet_rows {
            report.rows_read += 1;
            let parsed = match sheet_row.parsed {
                Ok(parsed) => parsed,
                Err(message) => {
                    report.fail(sheet_row.line, message);
                    continue;
                }
            };

            let mut tx = self.pool.begin().await?;
            match self
                .import_one(&mut tx, &parsed, chamber.as_ref(), report.batch_id, options.user_id)
                .await
            {
                Ok(allocated) => {
                    if options.dry_run {
                        tx.rollback().await?;
                    } else {
                        tx.commit().await?;
                    }
                    report.imported += 1;
                    if allocated {
                        report.allocated += 1;
                    } else {
                        report.pending += 1;
                    }
                }
                Err(e) => {
                    tx.rollback().await?;
                    tracing::warn!(line = sheet_row.line, error = %e, "Linha rejeitada na importação");
                    report.fail(sheet_row.line, user_message(&e));
                }
            }
        }

        tracing::info!(
            batch_id = %report.batch_id,
            read = report.rows_read,
            imported = report.imported,
            errors = report.errors.len(),
            dry_run = report.dry_run,
            "Importação concluída"
        );
        Ok(report)
    }

    /// Devolve `true` quando o produto entrou já alocado.
    async fn import_one(
        &self,
        conn: &mut PgConnection,
        row: &ParsedRow,
        chamber: Option<&Chamber>,
        batch_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let client_id = match row.client.as_deref() {
            Some(name) => {
                let (client, created) = self.client_service.find_or_create(&mut *conn, name).await?;
                if created {
                    tracing::info!(client_id = %client.id, name = %client.name, "Cliente criado na importação");
                }
                Some(client.id)
            }
            None => None,
        };

        let seed_type_id = match row.seed_type.as_deref() {
            Some(name) => {
                let (seed_type, created) = self.seed_type_service.find_or_create(&mut *conn, name).await?;
                if created {
                    tracing::info!(seed_type_id = %seed_type.id, name = %seed_type.name, "Tipo de semente criado na importação");
                }
                Some(seed_type.id)
            }
            None => None,
        };

        let location_id = match (row.coordinates, chamber) {
            (Some(coordinates), Some(chamber)) => {
                if !Dimensions::from(chamber).contains(&coordinates) {
                    return Err(AppError::BadRequest(format!(
                        "o local {} está fora das dimensões da câmara {}",
                        coordinates.code(),
                        chamber.name
                    )));
                }
                let location = self
                    .location_repo
                    .find_by_coordinates(&mut *conn, chamber.id, coordinates)
                    .await?
                    .ok_or_else(|| {
                        AppError::BadRequest(format!(
                            "o local {} não existe na câmara {}",
                            coordinates.code(),
                            chamber.name
                        ))
                    })?;
                Some(location.id)
            }
            _ => None,
        };

        let new = NewProduct {
            name: row.name.clone(),
            lot: row.lot.clone(),
            seed_type_id,
            client_id,
            location_id,
            quantity: row.quantity,
            weight_per_unit: row.weight_per_unit,
            storage_type: row.storage_type.clone(),
            entry_date: None,
            expiration_date: row.expiration_date,
            notes: row.notes.clone(),
        };
        self.product_service
            .create_in_tx(&mut *conn, &new, Some(batch_id), user_id)
            .await?;
        Ok(location_id.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Rows {
        data.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn lines_are_numbered_from_the_sheet() {
        let sheet = rows(&[
            &["Estoque"],
            &["Produto", "Lote", "Quantidade", "Peso"],
            &["Soja", "L1", "10", "25"],
            &["", "", "", ""],
            &["Milho", "", "5", "20"],
        ]);
        let parsed = parse_sheet(&sheet, false).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].line, 3);
        assert!(parsed[0].parsed.is_ok());
        assert_eq!(parsed[1].line, 5);
        assert!(parsed[1].parsed.is_err());
    }

    #[test]
    fn coordinates_need_a_chamber() {
        let sheet = rows(&[
            &["Produto", "Lote", "Quantidade", "Peso", "Quadra", "Lado", "Fila", "Andar"],
            &["Soja", "L1", "10", "25", "1", "1", "1", "1"],
        ]);
        assert!(parse_sheet(&sheet, false).unwrap()[0].parsed.is_err());
        assert!(parse_sheet(&sheet, true).unwrap()[0].parsed.is_ok());
    }

    #[test]
    fn sheet_without_header_is_rejected() {
        assert!(parse_sheet(&rows(&[&["a", "b"]]), false).is_err());
    }

    #[test]
    fn report_lists_errors_with_line_numbers() {
        let mut report = ImportReport::new(Uuid::nil(), false);
        report.rows_read = 2;
        report.imported = 1;
        report.pending = 1;
        report.fail(4, "quantidade deve ser maior que zero");
        let text = report.to_string();
        assert!(text.contains("Importadas:  1"));
        assert!(text.contains("linha 4: quantidade deve ser maior que zero"));
    }
}
