// src/importer/header.rs

use std::collections::HashMap;

/// Quantas linhas do topo da planilha são examinadas atrás do cabeçalho.
pub const HEADER_SCAN_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Lot,
    Quantity,
    WeightPerUnit,
    Quadra,
    Lado,
    Fila,
    Andar,
    Client,
    SeedType,
    StorageType,
    ExpirationDate,
    Notes,
}

const REQUIRED: [Column; 4] = [Column::Name, Column::Lot, Column::Quantity, Column::WeightPerUnit];

// Cabeçalhos já normalizados
const ALIASES: &[(&str, Column)] = &[
    ("produto", Column::Name),
    ("nome", Column::Name),
    ("nome do produto", Column::Name),
    ("lote", Column::Lot),
    ("quantidade", Column::Quantity),
    ("qtd", Column::Quantity),
    ("qtde", Column::Quantity),
    ("peso", Column::WeightPerUnit),
    ("peso por unidade", Column::WeightPerUnit),
    ("peso unitario", Column::WeightPerUnit),
    ("peso unidade", Column::WeightPerUnit),
    ("peso kg", Column::WeightPerUnit),
    ("quadra", Column::Quadra),
    ("lado", Column::Lado),
    ("fila", Column::Fila),
    ("andar", Column::Andar),
    ("cliente", Column::Client),
    ("depositante", Column::Client),
    ("tipo de semente", Column::SeedType),
    ("tipo semente", Column::SeedType),
    ("semente", Column::SeedType),
    ("tipo", Column::SeedType),
    ("armazenamento", Column::StorageType),
    ("tipo de armazenamento", Column::StorageType),
    ("validade", Column::ExpirationDate),
    ("data de validade", Column::ExpirationDate),
    ("vencimento", Column::ExpirationDate),
    ("observacoes", Column::Notes),
    ("observacao", Column::Notes),
    ("obs", Column::Notes),
];

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Minúsculas, sem acento, sem pontuação e com espaços colapsados.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn column_for(header: &str) -> Option<Column> {
    let key = normalize(header);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, column)| *column)
}

/// Posição de cada coluna reconhecida e a linha (0-based) onde o cabeçalho está.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    pub row_index: usize,
    columns: HashMap<Column, usize>,
}

impl HeaderMap {
    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.columns.get(&column).copied()
    }

    fn from_row(row_index: usize, row: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (index, cell) in row.iter().enumerate() {
            if let Some(column) = column_for(cell) {
                // A primeira ocorrência vence
                columns.entry(column).or_insert(index);
            }
        }
        Self { row_index, columns }
    }

    fn is_complete(&self) -> bool {
        REQUIRED.iter().all(|c| self.columns.contains_key(c))
    }
}

/// Procura, nas primeiras linhas, a que contém todos os cabeçalhos obrigatórios.
pub fn detect_header(rows: &[Vec<String>]) -> Option<HeaderMap> {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .map(|(index, row)| HeaderMap::from_row(index, row))
        .find(HeaderMap::is_complete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn normalize_ignores_case_accents_and_spacing() {
        assert_eq!(normalize("  Observações "), "observacoes");
        assert_eq!(normalize("PESO   por\tUnidade"), "peso por unidade");
        assert_eq!(normalize("Peso (kg)"), "peso kg");
    }

    #[test]
    fn aliases_map_to_the_same_column() {
        assert_eq!(column_for("Produto"), Some(Column::Name));
        assert_eq!(column_for("NOME"), Some(Column::Name));
        assert_eq!(column_for("Peso"), Some(Column::WeightPerUnit));
        assert_eq!(column_for("Peso por unidade"), Some(Column::WeightPerUnit));
        assert_eq!(column_for("Tipo de Semente"), Some(Column::SeedType));
        assert_eq!(column_for("Código interno"), None);
    }

    #[test]
    fn header_is_found_below_title_rows() {
        let rows = vec![
            row(&["Controle de estoque - Câmara 1"]),
            row(&[]),
            row(&["Produto", "Lote", "Quantidade", "Peso", "Quadra", "Lado", "Fila", "Andar"]),
            row(&["Soja", "L1", "10", "25", "1", "1", "1", "1"]),
        ];
        let header = detect_header(&rows).unwrap();
        assert_eq!(header.row_index, 2);
        assert_eq!(header.index_of(Column::WeightPerUnit), Some(3));
        assert_eq!(header.index_of(Column::Andar), Some(7));
    }

    #[test]
    fn missing_required_header_is_not_detected() {
        let rows = vec![row(&["Produto", "Lote", "Quantidade"])];
        assert!(detect_header(&rows).is_none());
    }

    #[test]
    fn header_beyond_scan_window_is_ignored() {
        let mut rows = vec![row(&["titulo"]); HEADER_SCAN_ROWS];
        rows.push(row(&["Produto", "Lote", "Quantidade", "Peso"]));
        assert!(detect_header(&rows).is_none());
    }
}
