//! Leitura de CSV e escrita de JSON Lines / CSV aumentado.

use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use title_ner_core::{SplitFields, TitleRecord, TrainingExample};

/// Nomes aceitos para a coluna de título quando nenhuma é informada.
pub const TITLE_COLUMNS: &[&str] = &["title", "titulo", "título"];

/// Colunas acrescentadas no modo de divisão.
pub const SPLIT_COLUMNS: [&str; 3] = ["model", "RAM", "storage_capacity"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Índice da coluna de título: a informada ou a primeira de [`TITLE_COLUMNS`].
    pub fn title_column(&self, explicit: Option<&str>) -> Result<usize> {
        let wanted: Vec<&str> = match explicit {
            Some(name) => vec![name],
            None => TITLE_COLUMNS.to_vec(),
        };
        wanted
            .iter()
            .find_map(|name| {
                self.headers
                    .iter()
                    .position(|h| h.trim().to_lowercase() == name.to_lowercase())
            })
            .with_context(|| format!("coluna de título não encontrada (procurando {wanted:?}, cabeçalho {:?})", self.headers))
    }

    /// Título de uma linha, sem alteração; célula vazia (ou só espaços) vira `None`.
    pub fn title(&self, row: &[String], column: usize) -> Option<String> {
        row.get(column).filter(|cell| !cell.trim().is_empty()).cloned()
    }

    /// Um registro por linha; as demais colunas viram campos.
    pub fn records(&self, title_column: usize) -> Vec<TitleRecord> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = TitleRecord {
                    title: self.title(row, title_column),
                    ..TitleRecord::default()
                };
                for (index, (header, cell)) in self.headers.iter().zip(row).enumerate() {
                    if index != title_column && !cell.trim().is_empty() {
                        record.fields.insert(header.clone(), cell.clone());
                    }
                }
                record
            })
            .collect()
    }

    pub fn titles(&self, title_column: usize) -> Vec<Option<String>> {
        self.rows.iter().map(|row| self.title(row, title_column)).collect()
    }
}

/// Lê um CSV com cabeçalho. Uma linha malformada aborta a leitura.
pub fn read_table<R: Read>(reader: R) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .context("falha ao ler o cabeçalho do CSV")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() {
        bail!("CSV sem cabeçalho");
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("linha {} malformada", line + 2))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(CsvTable { headers, rows })
}

/// Um exemplo de treino JSON por linha.
pub fn write_jsonl<W: Write>(mut writer: W, examples: &[TrainingExample]) -> Result<()> {
    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// A tabela original com as colunas de [`SPLIT_COLUMNS`].
///
/// Uma coluna que já exista com o mesmo nome é sobrescrita; as demais vão ao final.
pub fn write_split<W: Write>(writer: W, table: &CsvTable, fields: &[SplitFields]) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header = table.headers.clone();
    let mut targets = [0; SPLIT_COLUMNS.len()];
    for (target, column) in targets.iter_mut().zip(SPLIT_COLUMNS) {
        *target = match header.iter().position(|h| h == column) {
            Some(index) => index,
            None => {
                header.push(column.to_string());
                header.len() - 1
            }
        };
    }
    writer.write_record(&header)?;

    for (row, split) in table.rows.iter().zip(fields) {
        let mut out = row.clone();
        out.resize(header.len().max(out.len()), String::new());
        for (&target, value) in targets.iter().zip([&split.model, &split.ram, &split.storage_capacity]) {
            out[target] = value.clone().unwrap_or_default();
        }
        writer.write_record(&out)?;
    }
    writer.flush()?;
    Ok(())
}
