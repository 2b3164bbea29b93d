//! CLI de processamento em lote: gera dados de treino NER a partir de CSVs de
//! títulos e separa campos de títulos de tablets.

mod table;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use title_ner_core::{
    prepare_training_data, split_titles, Category, EngineConfig, ExtractionEngine, TitleSplitter,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "title-ner")]
#[command(about = "Anotação de entidades em títulos de produtos")]
struct Cli {
    /// Arquivo JSON com marcas e schemas que substituem os embutidos
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Converte um CSV de títulos em exemplos de treino (JSON Lines)
    TrainingData {
        /// notebook, tablet, smartphone, smartwatch ou tv
        #[arg(short, long)]
        category: Category,
        #[arg(short, long)]
        input: PathBuf,
        /// Saída JSONL (padrão: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Coluna do título (padrão: title, titulo ou título)
        #[arg(long)]
        title_column: Option<String>,
    },
    /// Acrescenta as colunas model, RAM e storage_capacity a um CSV de tablets
    Split {
        #[arg(short, long)]
        input: PathBuf,
        /// CSV de saída (padrão: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        title_column: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("configuração inválida em {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::TrainingData {
            category,
            input,
            output,
            title_column,
        } => {
            let engine = ExtractionEngine::new(&config)?;
            let data = read_input(&input)?;
            let column = data.title_column(title_column.as_deref())?;
            let records = data.records(column);

            let examples = prepare_training_data(&engine, category, &records);
            table::write_jsonl(open_output(output.as_deref())?, &examples)?;
            info!(
                %category,
                rows = records.len(),
                examples = examples.len(),
                "✅ dados de treino gravados"
            );
        }
        Command::Split {
            input,
            output,
            title_column,
        } => {
            let splitter = TitleSplitter::new(config.brand_vocabulary()?)?;
            let data = read_input(&input)?;
            let column = data.title_column(title_column.as_deref())?;

            let fields = split_titles(&splitter, &data.titles(column));
            table::write_split(open_output(output.as_deref())?, &data, &fields)?;
            let models = fields.iter().filter(|f| f.model.is_some()).count();
            info!(rows = fields.len(), models, "✅ títulos separados");
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<table::CsvTable> {
    let file = File::open(path).with_context(|| format!("não foi possível abrir {}", path.display()))?;
    table::read_table(BufReader::new(file)).with_context(|| format!("CSV inválido: {}", path.display()))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("não foi possível criar {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    })
}
