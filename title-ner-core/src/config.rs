//! # Configuração do Motor
//!
//! Configuração somente-leitura, carregada uma vez no início do processo e
//! passada explicitamente ao [`ExtractionEngine`](crate::ExtractionEngine).
//!
//! ```json
//! {
//!   "brands": ["Samsung", "Apple", "Xiaomi"],
//!   "schemas": {
//!     "tv": [
//!       { "strategy": "field", "label": "MODEL", "field": "modelo" },
//!       { "strategy": "pattern", "label": "SIZE", "pattern": "\\b\\d{2}\\b", "fallback": true }
//!     ]
//!   }
//! }
//! ```
//!
//! Campos omitidos usam os embutidos da [`patterns`](crate::patterns).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::patterns::{self, BrandVocabulary};
use crate::schema::{Category, CategorySchema, RuleSpec};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Substitui o vocabulário de marcas embutido
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,
    /// Substitui a tabela de regras de categorias específicas
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Vec<RuleSpec>>,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn brand_vocabulary(&self) -> Result<BrandVocabulary> {
        match &self.brands {
            Some(names) => BrandVocabulary::new(names),
            None => BrandVocabulary::builtin(),
        }
    }

    /// Tabela de regras efetiva de cada categoria.
    ///
    /// Chaves de `schemas` que não nomeiam uma categoria são erro.
    pub fn rule_tables(&self) -> Result<BTreeMap<Category, Vec<RuleSpec>>> {
        let mut tables: BTreeMap<Category, Vec<RuleSpec>> = Category::ALL
            .iter()
            .map(|&category| (category, patterns::builtin_rules(category)))
            .collect();
        for (key, specs) in &self.schemas {
            let category: Category = key.parse()?;
            tables.insert(category, specs.clone());
        }
        Ok(tables)
    }

    /// Compila todos os schemas, falhando no primeiro erro.
    pub fn compile_schemas(&self) -> Result<BTreeMap<Category, CategorySchema>> {
        self.rule_tables()?
            .into_iter()
            .map(|(category, specs)| CategorySchema::compile(category, &specs).map(|schema| (category, schema)))
            .collect()
    }
}
