//! # Schema de Categoria
//!
//! Cada categoria de produto é descrita por uma **tabela de regras** ordenada:
//! pares (rótulo, estratégia). O pipeline executa as regras estritamente nessa
//! ordem, então regras anteriores têm prioridade sobre o mesmo trecho do texto.
//!
//! Uma regra cujo rótulo já foi satisfeito é pulada. É assim que se expressa
//! "ground truth primeiro, heurística só para o que faltou":
//!
//! ```text
//! CPU  ← campo "CPU"              (ground truth)
//! ...
//! CPU  ← padrão "Intel Core ..."  (só roda se o campo não foi achado)
//! ```
//!
//! As tabelas são dados ([`RuleSpec`], serializáveis) e são compiladas uma vez
//! em [`CategorySchema`]. Rótulos desconhecidos, regex inválidas e templates
//! sem `{value}` falham aqui, na inicialização.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::label::{EntityLabel, SpanSource};
use crate::patterns;

/// Marcador substituído pelo valor (escapado) do campo num template.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Categorias de produto suportadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "notebooks", alias = "laptop")]
    Notebook,
    #[serde(alias = "tablets")]
    Tablet,
    #[serde(alias = "smartphones", alias = "celular")]
    Smartphone,
    #[serde(alias = "smartwatches", alias = "relogio")]
    Smartwatch,
    #[serde(alias = "tvs", alias = "televisao", alias = "television")]
    Tv,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Notebook,
        Category::Tablet,
        Category::Smartphone,
        Category::Smartwatch,
        Category::Tv,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Notebook => "notebook",
            Category::Tablet => "tablet",
            Category::Smartphone => "smartphone",
            Category::Smartwatch => "smartwatch",
            Category::Tv => "tv",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "notebook" | "notebooks" | "laptop" => Ok(Category::Notebook),
            "tablet" | "tablets" => Ok(Category::Tablet),
            "smartphone" | "smartphones" | "celular" => Ok(Category::Smartphone),
            "smartwatch" | "smartwatches" | "relogio" => Ok(Category::Smartwatch),
            "tv" | "tvs" | "televisao" | "television" => Ok(Category::Tv),
            _ => Err(ConfigError::UnknownCategory(s.to_string())),
        }
    }
}

/// Política de desempate quando vários candidatos numéricos sobrevivem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Primeiro candidato elegível na ordem do título
    #[default]
    First,
    /// Maior inteiro líder (armazenamento)
    Largest,
    /// Menor inteiro líder (RAM)
    Smallest,
}

/// Faixa inclusiva aceita para o inteiro líder de um candidato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumericConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

impl NumericConstraint {
    pub const fn between(min: u64, max: u64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Estritamente menor que `limit`
    pub const fn below(limit: u64) -> Self {
        Self {
            min: None,
            max: Some(limit.saturating_sub(1)),
        }
    }

    pub fn accepts(&self, value: u64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Forma declarativa (serializável) de uma regra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RuleSpec {
    /// Lê o campo `field` do registro e procura seu valor literal no título.
    ///
    /// Com `template`, o valor escapado substitui `{value}` e o span é o grupo
    /// nomeado `span` (ou o match inteiro, se o grupo não existir).
    Field {
        label: String,
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template: Option<String>,
    },
    /// Aplica uma regex, filtra pelo inteiro líder e desempata por `policy`.
    Pattern {
        label: String,
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<NumericConstraint>,
        #[serde(default)]
        policy: Policy,
        /// Marca o span aceito como `fallback` em vez de `regex`
        #[serde(default)]
        fallback: bool,
    },
    /// Primeira marca do vocabulário encontrada no título.
    Brand { label: String },
}

impl RuleSpec {
    pub fn field(label: EntityLabel, field: &str) -> Self {
        RuleSpec::Field {
            label: label.name().to_string(),
            field: field.to_string(),
            template: None,
        }
    }

    pub fn field_with_template(label: EntityLabel, field: &str, template: &str) -> Self {
        RuleSpec::Field {
            label: label.name().to_string(),
            field: field.to_string(),
            template: Some(template.to_string()),
        }
    }

    pub fn pattern(label: EntityLabel, pattern: &str, policy: Policy) -> Self {
        RuleSpec::Pattern {
            label: label.name().to_string(),
            pattern: pattern.to_string(),
            constraint: None,
            policy,
            fallback: false,
        }
    }

    pub fn fallback(label: EntityLabel, pattern: &str, constraint: Option<NumericConstraint>, policy: Policy) -> Self {
        RuleSpec::Pattern {
            label: label.name().to_string(),
            pattern: pattern.to_string(),
            constraint,
            policy,
            fallback: true,
        }
    }

    pub fn brand(label: EntityLabel) -> Self {
        RuleSpec::Brand {
            label: label.name().to_string(),
        }
    }

    pub fn label_name(&self) -> &str {
        match self {
            RuleSpec::Field { label, .. } | RuleSpec::Pattern { label, .. } | RuleSpec::Brand { label } => label,
        }
    }

    /// Nome curto da estratégia, usado em eventos e logs
    pub fn strategy_name(&self) -> &'static str {
        match self {
            RuleSpec::Field { .. } => "field",
            RuleSpec::Pattern { fallback: false, .. } => "pattern",
            RuleSpec::Pattern { fallback: true, .. } => "fallback",
            RuleSpec::Brand { .. } => "brand",
        }
    }
}

/// Estratégia compilada de uma regra.
#[derive(Debug, Clone)]
pub enum Matcher {
    Field {
        field: String,
        template: Option<String>,
    },
    Pattern {
        regex: Regex,
        constraint: Option<NumericConstraint>,
        policy: Policy,
        source: SpanSource,
    },
    Brand,
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub label: EntityLabel,
    pub matcher: Matcher,
    spec: RuleSpec,
}

impl CompiledRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let label: EntityLabel = spec.label_name().parse()?;
        let matcher = match spec {
            RuleSpec::Field { field, template, .. } => {
                if let Some(template) = template {
                    if !template.contains(VALUE_PLACEHOLDER) {
                        return Err(ConfigError::MissingPlaceholder { field: field.clone() });
                    }
                    // Valida a sintaxe do template com um valor qualquer
                    compile_case_insensitive(&template.replace(VALUE_PLACEHOLDER, "0"), label)?;
                }
                Matcher::Field {
                    field: field.clone(),
                    template: template.clone(),
                }
            }
            RuleSpec::Pattern {
                pattern,
                constraint,
                policy,
                fallback,
                ..
            } => Matcher::Pattern {
                regex: compile_case_insensitive(pattern, label)?,
                constraint: *constraint,
                policy: *policy,
                source: if *fallback { SpanSource::Fallback } else { SpanSource::Regex },
            },
            RuleSpec::Brand { .. } => Matcher::Brand,
        };
        Ok(Self {
            label,
            matcher,
            spec: spec.clone(),
        })
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }
}

/// Tabela de regras compilada de uma categoria.
#[derive(Debug, Clone)]
pub struct CategorySchema {
    category: Category,
    rules: Vec<CompiledRule>,
}

impl CategorySchema {
    pub fn compile(category: Category, specs: &[RuleSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(ConfigError::EmptySchema(category.name().to_string()));
        }
        let rules = specs.iter().map(CompiledRule::compile).collect::<Result<Vec<_>>>()?;
        Ok(Self { category, rules })
    }

    /// Schema embutido da categoria (ver [`patterns::builtin_rules`]).
    pub fn builtin(category: Category) -> Result<Self> {
        Self::compile(category, &patterns::builtin_rules(category))
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(|r| r.spec.clone()).collect()
    }

    /// `true` se alguma regra consulta o vocabulário de marcas
    pub fn uses_brands(&self) -> bool {
        self.rules.iter().any(|r| matches!(r.matcher, Matcher::Brand))
    }
}

/// Compila `pattern` sem diferenciar maiúsculas de minúsculas.
pub(crate) fn compile_case_insensitive(pattern: &str, label: EntityLabel) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            label: label.name().to_string(),
            source,
        })
}
