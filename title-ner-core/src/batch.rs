//! Processamento em lote com rayon.
//!
//! Cada título é independente, então os lotes são distribuídos pelo pool
//! global do rayon. A saída mantém a ordem da entrada.

use rayon::prelude::*;
use tracing::info;

use crate::pipeline::ExtractionEngine;
use crate::record::{TitleRecord, TrainingExample};
use crate::resolver::{SplitFields, TitleSplitter};
use crate::schema::Category;

/// Exemplos de treino do lote; registros sem entidades são descartados.
pub fn prepare_training_data(
    engine: &ExtractionEngine,
    category: Category,
    records: &[TitleRecord],
) -> Vec<TrainingExample> {
    let examples: Vec<TrainingExample> = records
        .par_iter()
        .filter_map(|record| engine.training_example(category, record))
        .collect();

    info!(
        %category,
        total = records.len(),
        kept = examples.len(),
        "dados de treino preparados"
    );
    examples
}

/// Colunas de divisão de cada título, uma por entrada.
pub fn split_titles(splitter: &TitleSplitter, titles: &[Option<String>]) -> Vec<SplitFields> {
    titles
        .par_iter()
        .map(|title| splitter.split(title.as_deref()))
        .collect()
}
