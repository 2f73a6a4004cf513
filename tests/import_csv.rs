// Pipeline de importação sobre CSV, sem banco.

use std::io::Write;

use rust_decimal::Decimal;
use seed_storage::importer::{parse_sheet, sheet};

const PLANILHA: &str = "\
Relatório de estoque;;;;;;;
;;;;;;;
Produto;Lote;Quantidade;Peso por unidade;Quadra;Lado;Fila;Andar;Cliente;Tipo de Semente
Soja BRS 284;L-001;40;25,5;1;1;1;1;Fazenda Boa Vista;Soja
Milho AG 1051;L-002;12;20;;;;;Sítio Esperança;Milho
Feijão;L-003;0;20;;;;;;
Trigo;L-004;8;30;2;1;;;;
";

#[test]
fn csv_file_goes_through_header_detection_and_row_parsing() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(PLANILHA.as_bytes()).unwrap();

    let rows = sheet::read_rows(file.path(), None).unwrap();
    let parsed = parse_sheet(&rows, true).unwrap();
    assert_eq!(parsed.len(), 4);

    let soja = parsed[0].parsed.as_ref().unwrap();
    assert_eq!(parsed[0].line, 4);
    assert_eq!(soja.weight_per_unit, Decimal::new(255, 1));
    assert!(soja.coordinates.is_some());
    assert_eq!(soja.seed_type.as_deref(), Some("Soja"));

    let milho = parsed[1].parsed.as_ref().unwrap();
    assert!(milho.coordinates.is_none());
    assert_eq!(milho.client.as_deref(), Some("Sítio Esperança"));

    // quantidade zero
    assert!(parsed[2].parsed.is_err());
    // coordenadas pela metade
    let err = parsed[3].parsed.as_ref().unwrap_err();
    assert!(err.contains("coordenadas"), "{err}");
}

#[test]
fn rows_with_coordinates_need_a_chamber() {
    let rows = sheet::read_csv(PLANILHA.as_bytes()).unwrap();
    let parsed = parse_sheet(&rows, false).unwrap();
    let err = parsed[0].parsed.as_ref().unwrap_err();
    assert!(err.contains("--chamber"));
    assert!(parsed[1].parsed.is_ok());
}
