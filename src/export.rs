// src/export.rs
//
// Exportação do estoque em CSV (separador ';', como o Excel em pt-BR espera).

use std::{fs::File, io::Write, path::Path};

use anyhow::{bail, Context};

use crate::{
    config::AppState,
    db::ChamberRepository,
    models::report::InventoryReport,
};

const HEADERS: [&str; 13] = [
    "Câmara",
    "Local",
    "Produto",
    "Lote",
    "Cliente",
    "Tipo de semente",
    "Status",
    "Quantidade",
    "Peso por unidade",
    "Peso total (kg)",
    "Entrada",
    "Validade",
    "ID",
];

pub fn write_inventory_csv<W: Write>(report: &InventoryReport, writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    csv_writer.write_record(HEADERS)?;

    for line in &report.lines {
        csv_writer.write_record([
            line.chamber_name.clone().unwrap_or_default(),
            line.location_code.clone().unwrap_or_default(),
            line.product_name.clone(),
            line.lot.clone(),
            line.client_name.clone().unwrap_or_default(),
            line.seed_type_name.clone().unwrap_or_default(),
            line.status.as_str().to_string(),
            line.quantity.normalize().to_string(),
            line.weight_per_unit.normalize().to_string(),
            format!("{:.3}", line.total_weight),
            line.entry_date.format("%d/%m/%Y").to_string(),
            line.expiration_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default(),
            line.product_id.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Grava o estoque ativo (opcionalmente de uma câmara) no arquivo.
/// Devolve quantas linhas foram exportadas.
pub async fn export_inventory(state: &AppState, path: &Path, chamber: Option<&str>) -> anyhow::Result<usize> {
    let chamber_id = match chamber {
        Some(name) => {
            let repo = ChamberRepository::new(state.db_pool.clone());
            match repo.find_by_name(&state.db_pool, name).await? {
                Some(chamber) => Some(chamber.id),
                None => bail!("Câmara '{}' não encontrada", name),
            }
        }
        None => None,
    };

    let report = state.report_service.inventory(chamber_id, None).await?;
    let file = File::create(path).with_context(|| format!("Não foi possível criar {}", path.display()))?;
    write_inventory_csv(&report, file)?;

    tracing::info!(file = %path.display(), lines = report.lines.len(), "Estoque exportado");
    Ok(report.lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{product::ProductStatus, report::InventoryReportLine};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn csv_has_header_and_one_line_per_product() {
        let report = InventoryReport {
            generated_at: Utc::now(),
            total_products: 1,
            total_quantity: Decimal::from(10),
            total_weight_kg: Decimal::from(250),
            lines: vec![InventoryReportLine {
                product_id: Uuid::nil(),
                product_name: "Soja".into(),
                lot: "L1".into(),
                status: ProductStatus::Locado,
                quantity: Decimal::from(10),
                weight_per_unit: Decimal::from(25),
                total_weight: Decimal::from(250),
                entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                expiration_date: None,
                chamber_name: Some("Câmara 1".into()),
                location_code: Some("Q01-L01-F01-A01".into()),
                seed_type_name: None,
                client_name: Some("Fazenda".into()),
            }],
        };

        let mut buffer = Vec::new();
        write_inventory_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Câmara;Local;Produto"));
        assert!(lines[1].starts_with("Câmara 1;Q01-L01-F01-A01;Soja;L1;Fazenda;;LOCADO;10;25;250.000;01/03/2026;;"));
    }
}
