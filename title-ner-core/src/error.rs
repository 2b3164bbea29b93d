//! Erros de configuração.
//!
//! Falhas por título (campo ausente, nenhum candidato, sobreposição) nunca
//! viram erro: o rótulo é simplesmente omitido. Os erros abaixo só surgem ao
//! montar o motor e abortam antes de qualquer título ser processado.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("rótulo desconhecido: {0}")]
    UnknownLabel(String),

    #[error("categoria desconhecida: {0}")]
    UnknownCategory(String),

    #[error("padrão inválido para {label}: {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("template do campo `{field}` não contém o marcador {{value}}")]
    MissingPlaceholder { field: String },

    #[error("vocabulário de marcas vazio")]
    EmptyBrandVocabulary,

    #[error("schema sem regras para a categoria {0}")]
    EmptySchema(String),

    #[error("erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
