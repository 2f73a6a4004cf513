// src/importer/sheet.rs

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{anyhow, bail, Context};
use calamine::{open_workbook_auto, Data, Reader};

/// Planilha lida como linhas de texto.
pub type Rows = Vec<Vec<String>>;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}

/// Lê a primeira aba (ou a aba informada) de um .xlsx/.xls/.ods.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> anyhow::Result<Rows> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Não foi possível abrir {}", path.display()))?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("A planilha não possui abas"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Aba '{}' não encontrada", name))?;

    Ok(range.rows().map(|row| row.iter().map(cell_text).collect()).collect())
}

// Planilhas exportadas em pt-BR costumam usar ';'
fn guess_delimiter(first_line: &str) -> u8 {
    if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Lê CSV de qualquer origem. O separador é deduzido da primeira linha.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Rows> {
    let mut reader = BufReader::new(reader);
    let mut content = String::new();
    reader.read_to_string(&mut content).context("Falha ao ler o CSV")?;
    let content = content.trim_start_matches('\u{feff}');

    let first_line = content.lines().next().unwrap_or_default();
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(guess_delimiter(first_line))
        .from_reader(content.as_bytes());

    let mut rows = Rows::new();
    for record in csv_reader.records() {
        let record = record.context("Linha de CSV inválida")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Escolhe o leitor pela extensão do arquivo.
pub fn read_rows(path: &Path, sheet: Option<&str>) -> anyhow::Result<Rows> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path, sheet),
        "csv" | "txt" => {
            let file = File::open(path).with_context(|| format!("Não foi possível abrir {}", path.display()))?;
            read_csv(file)
        }
        other => bail!("Formato de arquivo não suportado: '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_csv_is_detected() {
        let rows = read_csv("Produto;Lote;Quantidade;Peso\nSoja;L1;10;25,5\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Soja", "L1", "10", "25,5"]);
    }

    #[test]
    fn comma_csv_with_bom_and_ragged_rows() {
        let rows = read_csv("\u{feff}Produto,Lote,Quantidade,Peso\nMilho,L2,5\n".as_bytes()).unwrap();
        assert_eq!(rows[0][0], "Produto");
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(read_rows(Path::new("estoque.pdf"), None).is_err());
    }
}
