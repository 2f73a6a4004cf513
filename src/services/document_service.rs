// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, fonts, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::{
        location::LocationWithChamber,
        report::{InventoryReport, MovementReport},
    },
};

const FONT_FAMILY: &str = "Roboto";

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::DocumentError(e.to_string())
}

fn kg(value: rust_decimal::Decimal) -> String {
    format!("{:.3}", value)
}

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self { fonts_dir: fonts_dir.into() }
    }

    // Carrega a fonte da pasta configurada (Roboto-Regular.ttf, Roboto-Bold.ttf, ...)
    fn new_document(&self, title: &str) -> Result<genpdf::Document, AppError> {
        let font_family = fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "Fonte {} não encontrada na pasta {}",
                FONT_FAMILY,
                self.fonts_dir.display()
            ))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    pub fn inventory_pdf(&self, report: &InventoryReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document("Relatório de Estoque")?;
        doc.set_font_size(8);

        doc.push(elements::Paragraph::new("RELATÓRIO DE ESTOQUE").styled(style::Style::new().bold().with_font_size(16)));
        doc.push(elements::Paragraph::new(format!(
            "Gerado em {}",
            report.generated_at.format("%d/%m/%Y %H:%M")
        )));
        doc.push(elements::Break::new(1.5));

        // Pesos das colunas: Câmara, Local, Produto, Lote, Cliente, Qtd, Peso, Status
        let mut table = elements::TableLayout::new(vec![2, 2, 3, 2, 3, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Câmara").styled(bold))
            .element(elements::Paragraph::new("Local").styled(bold))
            .element(elements::Paragraph::new("Produto").styled(bold))
            .element(elements::Paragraph::new("Lote").styled(bold))
            .element(elements::Paragraph::new("Cliente").styled(bold))
            .element(elements::Paragraph::new("Qtd").styled(bold))
            .element(elements::Paragraph::new("Peso (kg)").styled(bold))
            .element(elements::Paragraph::new("Status").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for line in &report.lines {
            table
                .row()
                .element(elements::Paragraph::new(line.chamber_name.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(line.location_code.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(line.product_name.clone()))
                .element(elements::Paragraph::new(line.lot.clone()))
                .element(elements::Paragraph::new(line.client_name.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(line.quantity.normalize().to_string()))
                .element(elements::Paragraph::new(kg(line.total_weight)))
                .element(elements::Paragraph::new(line.status.as_str()))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        let mut totals = elements::Paragraph::new(format!(
            "{} produto(s) | {} unidade(s) | {} kg",
            report.total_products,
            report.total_quantity.normalize(),
            kg(report.total_weight_kg)
        ));
        totals.set_alignment(Alignment::Right);
        doc.push(totals.styled(style::Style::new().bold().with_font_size(10)));

        Self::render(doc)
    }

    pub fn movements_pdf(&self, report: &MovementReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document("Relatório de Movimentações")?;
        doc.set_font_size(8);

        doc.push(
            elements::Paragraph::new("RELATÓRIO DE MOVIMENTAÇÕES").styled(style::Style::new().bold().with_font_size(16)),
        );
        let period = match (report.from, report.to) {
            (Some(from), Some(to)) => format!("Período: {} a {}", from.format("%d/%m/%Y"), to.format("%d/%m/%Y")),
            (Some(from), None) => format!("A partir de {}", from.format("%d/%m/%Y")),
            (None, Some(to)) => format!("Até {}", to.format("%d/%m/%Y")),
            (None, None) => "Período: todo o histórico".to_string(),
        };
        doc.push(elements::Paragraph::new(period));
        doc.push(elements::Break::new(1.5));

        // Data, Tipo, Produto, Lote, Origem, Destino, Qtd, Peso, Usuário
        let mut table = elements::TableLayout::new(vec![2, 2, 3, 2, 2, 2, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Data").styled(bold))
            .element(elements::Paragraph::new("Tipo").styled(bold))
            .element(elements::Paragraph::new("Produto").styled(bold))
            .element(elements::Paragraph::new("Lote").styled(bold))
            .element(elements::Paragraph::new("Origem").styled(bold))
            .element(elements::Paragraph::new("Destino").styled(bold))
            .element(elements::Paragraph::new("Qtd").styled(bold))
            .element(elements::Paragraph::new("Peso (kg)").styled(bold))
            .element(elements::Paragraph::new("Usuário").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for m in &report.movements {
            table
                .row()
                .element(elements::Paragraph::new(m.movement.created_at.format("%d/%m/%Y %H:%M").to_string()))
                .element(elements::Paragraph::new(format!("{:?}", m.movement.movement_type).to_uppercase()))
                .element(elements::Paragraph::new(m.product_name.clone()))
                .element(elements::Paragraph::new(m.product_lot.clone()))
                .element(elements::Paragraph::new(m.from_location_code.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(m.to_location_code.clone().unwrap_or_else(|| "-".into())))
                .element(elements::Paragraph::new(m.movement.quantity.normalize().to_string()))
                .element(elements::Paragraph::new(kg(m.movement.weight)))
                .element(elements::Paragraph::new(m.user_name.clone().unwrap_or_else(|| "-".into())))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        let mut totals = elements::Paragraph::new(format!(
            "Entradas: {} kg | Saídas: {} kg",
            kg(report.total_entries_kg),
            kg(report.total_exits_kg)
        ));
        totals.set_alignment(Alignment::Right);
        doc.push(totals.styled(style::Style::new().bold().with_font_size(10)));

        Self::render(doc)
    }

    /// Etiqueta do local: câmara, código e QR code com o código do local.
    pub fn location_label(&self, location: &LocationWithChamber) -> Result<Vec<u8>, AppError> {
        let code = &location.location.code;
        let mut doc = self.new_document(&format!("Etiqueta {}", code))?;
        doc.set_paper_size(genpdf::Size::new(100, 80));

        let mut chamber = elements::Paragraph::new(location.chamber_name.clone());
        chamber.set_alignment(Alignment::Center);
        doc.push(chamber.styled(style::Style::new().with_font_size(12)));

        let mut title = elements::Paragraph::new(code.clone());
        title.set_alignment(Alignment::Center);
        doc.push(title.styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Break::new(1));

        let qr = QrCode::new(code.as_bytes()).map_err(pdf_error)?;
        let image_buffer = qr.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_alignment(Alignment::Center)
            .with_scale(genpdf::Scale::new(1.5, 1.5));
        doc.push(pdf_image);

        let mut capacity = elements::Paragraph::new(format!(
            "Capacidade: {} kg",
            kg(location.location.max_capacity_kg)
        ));
        capacity.set_alignment(Alignment::Center);
        doc.push(capacity.styled(style::Style::new().with_font_size(9)));

        Self::render(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn missing_fonts_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let service = DocumentService::new(dir.path());
        let report = InventoryReport {
            generated_at: Utc::now(),
            total_products: 0,
            total_quantity: rust_decimal::Decimal::ZERO,
            total_weight_kg: rust_decimal::Decimal::ZERO,
            lines: vec![],
        };
        assert!(matches!(service.inventory_pdf(&report), Err(AppError::FontNotFound(_))));
    }

    #[test]
    fn weights_use_three_decimals() {
        assert_eq!(kg(rust_decimal::Decimal::new(15, 1)), "1.500");
    }
}
