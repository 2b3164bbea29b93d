//! # Resolvedor de Marca/Modelo (modo de divisão de títulos)
//!
//! Preenche colunas `model`, `RAM` e `storage_capacity` a partir do título de
//! um tablet. Os três campos são resolvidos de forma independente, sem
//! registro de spans compartilhado.
//!
//! ## MODEL
//! 1. Padrão de geração do iPad ("iPad Pro 5ª geração"), prioridade máxima.
//! 2. Senão, a primeira marca do vocabulário (na ordem da lista) e as até
//!    [`MODEL_WINDOW`] palavras seguintes, sem a própria marca.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::label::EntityLabel;
use crate::patterns::BrandVocabulary;
use crate::schema::{compile_case_insensitive, NumericConstraint};

pub const IPAD_GENERATION_PATTERN: &str = r"iPad\s?(Pro)?\s?(\d+ª|\d+th)\s?(geração|generation)?";

pub const SPLIT_RAM_PATTERN: &str = r"(\d+)\s*GB\s*(RAM)?";

pub const SPLIT_STORAGE_PATTERN: &str = r"(\d+)\s*(GB|TB)";

/// Quantidade de palavras após a marca que formam o modelo.
pub const MODEL_WINDOW: usize = 3;

pub const SPLIT_RAM_RANGE: NumericConstraint = NumericConstraint::between(4, 64);

pub const SPLIT_STORAGE_MIN: NumericConstraint = NumericConstraint::at_least(32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    IpadGeneration,
    BrandWindow { brand: String },
}

/// Modelo encontrado e seu intervalo de bytes no título.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub source: ModelSource,
}

/// Colunas adicionadas a cada linha no modo de divisão.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitFields {
    pub model: Option<String>,
    #[serde(rename = "RAM")]
    pub ram: Option<String>,
    pub storage_capacity: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TitleSplitter {
    brands: BrandVocabulary,
    ipad: Regex,
    ram: Regex,
    storage: Regex,
}

impl TitleSplitter {
    pub fn new(brands: BrandVocabulary) -> Result<Self> {
        Ok(Self {
            brands,
            ipad: compile_case_insensitive(IPAD_GENERATION_PATTERN, EntityLabel::Model)?,
            ram: compile_case_insensitive(SPLIT_RAM_PATTERN, EntityLabel::Ram)?,
            storage: compile_case_insensitive(SPLIT_STORAGE_PATTERN, EntityLabel::Storage)?,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(BrandVocabulary::builtin()?)
    }

    pub fn brands(&self) -> &BrandVocabulary {
        &self.brands
    }

    pub fn resolve_model(&self, title: &str) -> Option<ModelMatch> {
        if let Some(m) = self.ipad.find(title) {
            let text = m.as_str().trim_end();
            return Some(ModelMatch {
                text: text.to_string(),
                start: m.start(),
                end: m.start() + text.len(),
                source: ModelSource::IpadGeneration,
            });
        }

        // Só a primeira marca encontrada importa, mesmo sem palavras depois dela
        let (brand, m) = self.brands.first_match(title)?;
        let (start, end, text) = token_window(title, m.end(), MODEL_WINDOW)?;
        Some(ModelMatch {
            text,
            start,
            end,
            source: ModelSource::BrandWindow {
                brand: brand.name.clone(),
            },
        })
    }

    /// Primeiro "<n> GB" do título, formatado como `"<n> GB"`.
    ///
    /// Só o primeiro match é considerado: se `n` estiver fora de [4, 64], não
    /// há RAM, mesmo que um match posterior estivesse na faixa.
    pub fn extract_ram(&self, title: &str) -> Option<String> {
        let caps = self.ram.captures(title)?;
        let value: u64 = caps.get(1)?.as_str().parse().ok()?;
        SPLIT_RAM_RANGE.accepts(value).then(|| format!("{value} GB"))
    }

    /// Primeiro "<n> GB|TB" do título, formatado como `"<n> <UNIDADE>"`.
    ///
    /// Como na RAM, a faixa (`n` >= 32) vale apenas para o primeiro match.
    pub fn extract_storage(&self, title: &str) -> Option<String> {
        let caps = self.storage.captures(title)?;
        let value: u64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_uppercase();
        SPLIT_STORAGE_MIN.accepts(value).then(|| format!("{value} {unit}"))
    }

    /// Resolve as três colunas; título ausente deixa todas vazias.
    pub fn split(&self, title: Option<&str>) -> SplitFields {
        let Some(title) = title else {
            return SplitFields::default();
        };
        SplitFields {
            model: self.resolve_model(title).map(|m| m.text),
            ram: self.extract_ram(title),
            storage_capacity: self.extract_storage(title),
        }
    }
}

/// Até `count` palavras separadas por espaço a partir do byte `from`.
///
/// Retorna o intervalo coberto e as palavras unidas por um espaço.
fn token_window(title: &str, from: usize, count: usize) -> Option<(usize, usize, String)> {
    let rest = title.get(from..)?;
    let mut tokens = Vec::with_capacity(count);
    let mut offset = 0;
    for token in rest.split_whitespace().take(count) {
        // split_whitespace devolve fatias de `rest`, em ordem
        let local = offset + rest[offset..].find(token)?;
        offset = local + token.len();
        tokens.push((from + local, from + offset, token));
    }
    let (start, _, _) = *tokens.first()?;
    let (_, end, _) = *tokens.last()?;
    let text = tokens.iter().map(|(_, _, t)| *t).collect::<Vec<_>>().join(" ");
    Some((start, end, text))
}
