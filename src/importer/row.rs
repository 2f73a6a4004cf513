// src/importer/row.rs

use chrono::NaiveDate;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::str::FromStr;
use thiserror::Error;

use crate::{
    importer::header::{Column, HeaderMap},
    models::{
        location::Coordinates,
        product::{measure, total_weight, MeasureError},
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("campo obrigatório vazio: {0}")]
    Missing(&'static str),

    #[error("valor inválido para {field}: '{value}'")]
    Invalid { field: &'static str, value: String },

    #[error("{0} deve ser maior que zero")]
    NotPositive(&'static str),

    #[error("{0} excede o máximo de 999999999,999")]
    TooLarge(&'static str),

    #[error("peso total inválido: {0}")]
    Weight(MeasureError),

    #[error("coordenadas incompletas: informe quadra, lado, fila e andar, ou nenhuma delas")]
    PartialCoordinates,
}

/// Uma linha de dados já convertida.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub name: String,
    pub lot: String,
    pub quantity: Decimal,
    pub weight_per_unit: Decimal,
    pub coordinates: Option<Coordinates>,
    pub client: Option<String>,
    pub seed_type: Option<String>,
    pub storage_type: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn cell<'a>(header: &HeaderMap, row: &'a [String], column: Column) -> Option<&'a str> {
    header
        .index_of(column)
        .and_then(|i| row.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Aceita "1234.5", "1234,5" e "1.234,5".
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };
    Decimal::from_str(&normalized).ok()
}

fn positive(header: &HeaderMap, row: &[String], column: Column, field: &'static str) -> Result<Decimal, RowError> {
    let raw = cell(header, row, column).ok_or(RowError::Missing(field))?;
    let value = parse_decimal(raw).ok_or_else(|| RowError::Invalid { field, value: raw.to_string() })?;
    // Células com fórmula chegam com muitas casas; o banco guarda 3
    measure(value, field).map_err(|e| match e {
        MeasureError::TooLarge(_) => RowError::TooLarge(field),
        _ => RowError::NotPositive(field),
    })
}

fn coordinate(raw: &str, field: &'static str) -> Result<i32, RowError> {
    let invalid = || RowError::Invalid { field, value: raw.to_string() };
    // Planilhas costumam trazer números inteiros como "3.0"
    let value = parse_decimal(raw).ok_or_else(invalid)?;
    if !value.fract().is_zero() || value < Decimal::ONE {
        return Err(invalid());
    }
    value.to_i32().ok_or_else(invalid)
}

fn parse_coordinates(header: &HeaderMap, row: &[String]) -> Result<Option<Coordinates>, RowError> {
    let values = [
        (cell(header, row, Column::Quadra), "quadra"),
        (cell(header, row, Column::Lado), "lado"),
        (cell(header, row, Column::Fila), "fila"),
        (cell(header, row, Column::Andar), "andar"),
    ];
    let filled = values.iter().filter(|(v, _)| v.is_some()).count();
    match filled {
        0 => Ok(None),
        4 => {
            let mut parsed = [0i32; 4];
            for (slot, (value, field)) in parsed.iter_mut().zip(values.iter()) {
                *slot = coordinate(value.unwrap_or_default(), *field)?;
            }
            let [quadra, lado, fila, andar] = parsed;
            Ok(Some(Coordinates { quadra, lado, fila, andar }))
        }
        _ => Err(RowError::PartialCoordinates),
    }
}

/// Datas em dd/mm/aaaa ou aaaa-mm-dd.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Converte a linha. `Ok(None)` para linhas totalmente vazias.
pub fn parse_row(header: &HeaderMap, row: &[String]) -> Result<Option<ParsedRow>, RowError> {
    if row.iter().all(|c| c.trim().is_empty()) {
        return Ok(None);
    }

    let name = cell(header, row, Column::Name).ok_or(RowError::Missing("produto"))?;
    let lot = cell(header, row, Column::Lot).ok_or(RowError::Missing("lote"))?;
    let quantity = positive(header, row, Column::Quantity, "quantidade")?;
    let weight_per_unit = positive(header, row, Column::WeightPerUnit, "peso por unidade")?;
    total_weight(quantity, weight_per_unit).map_err(RowError::Weight)?;
    let coordinates = parse_coordinates(header, row)?;

    let expiration_date = match cell(header, row, Column::ExpirationDate) {
        Some(raw) => Some(parse_date(raw).ok_or_else(|| RowError::Invalid {
            field: "validade",
            value: raw.to_string(),
        })?),
        None => None,
    };

    let text = |column| cell(header, row, column).map(str::to_string);
    Ok(Some(ParsedRow {
        name: name.to_string(),
        lot: lot.to_string(),
        quantity,
        weight_per_unit,
        coordinates,
        client: text(Column::Client),
        seed_type: text(Column::SeedType),
        storage_type: text(Column::StorageType),
        expiration_date,
        notes: text(Column::Notes),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::header::detect_header;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> HeaderMap {
        detect_header(&[row(&[
            "Produto", "Lote", "Quantidade", "Peso", "Quadra", "Lado", "Fila", "Andar", "Cliente", "Validade",
        ])])
        .unwrap()
    }

    #[test]
    fn full_row_is_parsed() {
        let parsed = parse_row(
            &header(),
            &row(&["Soja", "L-01", "10", "25,5", "1", "2", "3.0", "4", "Fazenda Boa Vista", "31/12/2026"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.quantity, Decimal::from(10));
        assert_eq!(parsed.weight_per_unit, Decimal::new(255, 1));
        assert_eq!(parsed.coordinates, Some(Coordinates { quadra: 1, lado: 2, fila: 3, andar: 4 }));
        assert_eq!(parsed.client.as_deref(), Some("Fazenda Boa Vista"));
        assert_eq!(parsed.expiration_date, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn blank_row_is_skipped() {
        assert_eq!(parse_row(&header(), &row(&["", " ", ""])).unwrap(), None);
    }

    #[test]
    fn row_without_coordinates_stays_pending() {
        let parsed = parse_row(&header(), &row(&["Milho", "L2", "5", "20"])).unwrap().unwrap();
        assert_eq!(parsed.coordinates, None);
    }

    #[test]
    fn coordinates_are_all_or_none() {
        let err = parse_row(&header(), &row(&["Milho", "L2", "5", "20", "1", "", "2", ""])).unwrap_err();
        assert_eq!(err, RowError::PartialCoordinates);
    }

    #[test]
    fn required_fields_are_checked() {
        assert_eq!(
            parse_row(&header(), &row(&["", "L2", "5", "20"])).unwrap_err(),
            RowError::Missing("produto")
        );
        assert_eq!(
            parse_row(&header(), &row(&["Milho", "L2", "0", "20"])).unwrap_err(),
            RowError::NotPositive("quantidade")
        );
        assert!(matches!(
            parse_row(&header(), &row(&["Milho", "L2", "cinco", "20"])).unwrap_err(),
            RowError::Invalid { field: "quantidade", .. }
        ));
    }

    #[test]
    fn formula_values_are_rounded_to_three_places() {
        let parsed = parse_row(&header(), &row(&["Milho", "L2", "30", "8.333333333333334"]))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.weight_per_unit, Decimal::new(8333, 3));
    }

    #[test]
    fn out_of_range_values_are_row_errors() {
        assert_eq!(
            parse_row(&header(), &row(&["Milho", "L2", "100000000000000000000", "20"])).unwrap_err(),
            RowError::TooLarge("quantidade")
        );
        assert_eq!(
            parse_row(&header(), &row(&["Milho", "L2", "0,001", "0,001"])).unwrap_err(),
            RowError::Weight(MeasureError::TotalNotPositive)
        );
    }

    #[test]
    fn brazilian_number_format_is_accepted() {
        assert_eq!(parse_decimal("1.234,5"), Some(Decimal::new(12345, 1)));
        assert_eq!(parse_decimal("1234.5"), Some(Decimal::new(12345, 1)));
        assert_eq!(parse_decimal("abc"), None);
    }
}
