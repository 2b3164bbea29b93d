//! # Biblioteca de Padrões
//!
//! Catálogo embutido de expressões regulares, restrições numéricas e tabelas de
//! regras por categoria, mais o vocabulário de marcas conhecidas.
//!
//! ## Por que RAM e armazenamento precisam de filtros?
//!
//! Ambos aparecem como "<n> GB" no mesmo título ("64GB 4GB RAM"). O motor
//! separa os dois com:
//! - **ordem**: STORAGE reivindica seu trecho antes de RAM;
//! - **política**: maior valor para STORAGE, menor para RAM;
//! - **faixas**: o fallback de RAM sem a palavra "RAM" só aceita valores < 12.

use std::collections::HashSet;

use regex::{Match, Regex};

use crate::error::{ConfigError, Result};
use crate::label::EntityLabel;
use crate::schema::{compile_case_insensitive, Category, NumericConstraint, Policy, RuleSpec};

pub const CPU_PATTERN: &str = r"\b(Intel Core [^\s]+|AMD Ryzen [^\s]+)\b";

pub const GPU_PATTERN: &str = r"\b(GTX \d+\s*(?:Ti|Super)?|RTX \d+\s*(?:Ti|Super)?|Radeon\s*\w+\s*\d*\w*|NVIDIA\s*\w+\s*\d*\w*|Intel\s*(?:Iris\s*Xe|UHD|HD\s*Graphics)|\bAMD\s*\w+\s*\d*\w*|GT\d+\s*|MX\d+\s*)\b";

pub const NOTEBOOK_RAM_PATTERN: &str = r"\b(\d+\s*GB RAM|\d+\s*G RAM|\d+\s*GB)\b";

pub const SSD_PATTERN: &str = r"\b(\d+\s*GB SSD|\d+\s*TB SSD)\b";

pub const STORAGE_PATTERN: &str = r"\b(\d+\s*GB|\d+\s*TB)\b";

pub const RAM_PATTERN: &str = r"\b(\d+\s*GB RAM|\d+\s*G RAM|\d+\s*GB|\d+\s*RAM)\b";

/// Usado quando o título não traz um padrão explícito de RAM.
pub const RAM_FALLBACK_PATTERN: &str = r"\b\d+\s*(?:RAM|G)\b";

/// Teto (exclusivo) do fallback de RAM.
pub const RAM_FALLBACK_CEILING: u64 = 12;

pub const CAMERA_PATTERN: &str = r"\b(\d+\s*Mpx)\b";

pub const DUAL_CHIP_PATTERN: &str = r"\bDUAL\s*(CHIP|SIM)\b";

/// Polegadas seguidas de unidade: `50"`, `50 polegadas`, `50pol`.
pub const SIZE_WITH_UNIT_TEMPLATE: &str = r#"\b(?P<span>{value})\b[\s"]?(?:polegadas|pol|")"#;

pub const SIZE_BARE_TEMPLATE: &str = r"\b(?P<span>{value})\b";

/// Último recurso para SIZE: primeiro número isolado de dois dígitos.
pub const SIZE_FALLBACK_PATTERN: &str = r"\b\d{2}\b";

/// Marcas conhecidas, na ordem de prioridade da varredura.
///
/// A lista contém repetições; [`BrandVocabulary::new`] mantém só a primeira
/// ocorrência de cada nome.
pub const BUILTIN_BRANDS: &[&str] = &[
    "ACER", "ASUS", "SAMSUNG", "Dell", "Positivo", "Lenovo", "VAIO",
    "HP", "Apple", "Multilaser", "Anvazise", "ASHATA", "Santino", "MSI",
    "Marca Fácil", "Microsoft", "AWOW", "Gateway", "Compaq", "DAUERHAFT",
    "SGIN", "Luqeeg", "Kiboule", "LG", "Panasonic", "Focket", "Toughbook",
    "LTI", "GIGABYTE", "Octoo", "Chip7 Informática", "GLOGLOW", "GOLDENTEC",
    "KUU", "HEEPDD", "Adamantiun", "Naroote", "Jectse", "Heayzoki", "Galaxy",
    "Motorola", "Xiaomi", "Nokia", "Poco", "realme", "Infinix", "Blu",
    "Gshield", "Geonav", "Redmi", "Gorila Shield", "intelbras", "TCL",
    "Tecno", "Vbestlife", "MaiJin", "SZAMBIT", "Otterbox", "Sony",
    "HAIZ", "HUAWEI", "HAYLOU", "Amazfit", "Ticwatch", "Legado Engenharia",
    "Microwear", "Lefal Cold", "MPOWER", "Kaymcixs", "Garmin", "123Smart",
    "Technos", "IWO", "Polar", "Mormaii", "xsmart",
    "EIGIIS", "Beyamis", "Hrich", "ANCOOL", "Dpofirs", "C7 company",
    "ShieldForce", "FIT IT", "Blackview", "KALINCO", "Danet", "LDFAS",
    "VINGVO", "MIJOBS", "KADES", "Naroote", "Gusfeliz",
    "Fossil", "Withings", "Suunto", "Mobvoi", "Amazfit", "Garmin", "Fitbit",
    "Huawei", "Apple", "Samsung", "TicWatch", "Polar", "Tag Heuer", "Casio",
    "Amazfit", "Garmin", "Suunto", "Huawei", "Fitbit", "Amazfit", "Withings",
    "Fossil", "Huawei", "Michael Kors", "Misfit", "TomTom", "Jawbone", "Zepp", "Philco",
    "Britânia", "Roku", "Dolby", "Philips", "Semp",
];

/// Tabela de regras embutida de cada categoria.
pub fn builtin_rules(category: Category) -> Vec<RuleSpec> {
    use EntityLabel as L;

    match category {
        Category::Notebook => vec![
            RuleSpec::field(L::Model, "modelo"),
            // exportações de retreino usam "model"
            RuleSpec::field(L::Model, "model"),
            RuleSpec::field(L::Cpu, "CPU"),
            RuleSpec::field(L::Gpu, "GPU"),
            RuleSpec::field(L::Ram, "RAM"),
            RuleSpec::field(L::Ssd, "SSD"),
            RuleSpec::pattern(L::Cpu, CPU_PATTERN, Policy::First),
            RuleSpec::pattern(L::Gpu, GPU_PATTERN, Policy::First),
            RuleSpec::pattern(L::Ram, NOTEBOOK_RAM_PATTERN, Policy::Smallest),
            RuleSpec::pattern(L::Ssd, SSD_PATTERN, Policy::First),
        ],
        Category::Tablet => vec![
            RuleSpec::field(L::Model, "modelo"),
            RuleSpec::field(L::Ram, "RAM"),
            RuleSpec::field(L::Storage, "armazenamento"),
            RuleSpec::pattern(L::Storage, STORAGE_PATTERN, Policy::Largest),
            RuleSpec::pattern(L::Ram, RAM_PATTERN, Policy::Smallest),
            ram_fallback(),
        ],
        Category::Smartphone => vec![
            RuleSpec::field(L::Model, "modelo"),
            RuleSpec::pattern(L::Storage, STORAGE_PATTERN, Policy::Largest),
            RuleSpec::pattern(L::Ram, RAM_PATTERN, Policy::Smallest),
            ram_fallback(),
            RuleSpec::pattern(L::Camera, CAMERA_PATTERN, Policy::First),
            RuleSpec::pattern(L::DualChip, DUAL_CHIP_PATTERN, Policy::First),
        ],
        Category::Smartwatch => vec![RuleSpec::brand(L::Brand), RuleSpec::field(L::Model, "modelo")],
        Category::Tv => vec![
            RuleSpec::field(L::Model, "modelo"),
            RuleSpec::field_with_template(L::Size, "polegadas", SIZE_WITH_UNIT_TEMPLATE),
            RuleSpec::field_with_template(L::Size, "polegadas", SIZE_BARE_TEMPLATE),
            RuleSpec::fallback(L::Size, SIZE_FALLBACK_PATTERN, None, Policy::First),
            RuleSpec::field(L::Resolution, "resolucao"),
            RuleSpec::field(L::Technology, "tecnologia"),
        ],
    }
}

fn ram_fallback() -> RuleSpec {
    RuleSpec::fallback(
        EntityLabel::Ram,
        RAM_FALLBACK_PATTERN,
        Some(NumericConstraint::below(RAM_FALLBACK_CEILING)),
        Policy::Smallest,
    )
}

/// Uma marca do vocabulário e sua regex `\b<marca>\b`.
#[derive(Debug, Clone)]
pub struct Brand {
    pub name: String,
    regex: Regex,
}

impl Brand {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn find<'t>(&self, title: &'t str) -> Option<Match<'t>> {
        self.regex.find(title)
    }
}

/// Conjunto ordenado de marcas, casadas sem diferenciar maiúsculas e com
/// fronteira de palavra.
#[derive(Debug, Clone)]
pub struct BrandVocabulary {
    brands: Vec<Brand>,
}

impl BrandVocabulary {
    /// Monta o vocabulário preservando a ordem; nomes repetidos (ignorando
    /// maiúsculas) e vazios são descartados. Vocabulário vazio é erro.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut brands = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                continue;
            }
            let pattern = format!(r"\b{}\b", regex::escape(name));
            brands.push(Brand {
                name: name.to_string(),
                regex: compile_case_insensitive(&pattern, EntityLabel::Brand)?,
            });
        }
        if brands.is_empty() {
            return Err(ConfigError::EmptyBrandVocabulary);
        }
        Ok(Self { brands })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_BRANDS.iter().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Brand> {
        self.brands.iter()
    }

    /// Primeira marca (na ordem do vocabulário) presente no título.
    pub fn first_match<'t>(&self, title: &'t str) -> Option<(&Brand, Match<'t>)> {
        self.brands
            .iter()
            .find_map(|brand| brand.find(title).map(|m| (brand, m)))
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(pattern: &str) -> Regex {
        compile_case_insensitive(pattern, EntityLabel::Model).unwrap()
    }

    fn matches(pattern: &str, text: &str) -> Vec<String> {
        regex(pattern).find_iter(text).map(|m| m.as_str().to_string()).collect()
    }

    #[test]
    fn test_vocabulary_dedupes_case_insensitively() {
        let vocab = BrandVocabulary::new(["Samsung", "Apple", "SAMSUNG", " ", "apple"]).unwrap();
        let names: Vec<&str> = vocab.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Samsung", "Apple"]);
    }

    #[test]
    fn test_empty_vocabulary_is_config_error() {
        let empty: [&str; 0] = [];
        assert!(matches!(BrandVocabulary::new(empty), Err(ConfigError::EmptyBrandVocabulary)));
        assert!(matches!(BrandVocabulary::new([""]), Err(ConfigError::EmptyBrandVocabulary)));
    }

    #[test]
    fn test_brand_requires_word_boundary() {
        let vocab = BrandVocabulary::new(["LG", "Poco"]).unwrap();
        assert!(vocab.first_match("Smartphone Pocophone F1").is_none());
        let (brand, m) = vocab.first_match("Smart TV lg 50").unwrap();
        assert_eq!(brand.name, "LG");
        assert_eq!(m.as_str(), "lg");
    }

    #[test]
    fn test_first_match_follows_vocabulary_order() {
        let vocab = BrandVocabulary::builtin().unwrap();
        // "Galaxy" aparece antes no título, mas "SAMSUNG" vem antes na lista
        let (brand, _) = vocab.first_match("Galaxy Watch Samsung 44mm").unwrap();
        assert_eq!(brand.name, "SAMSUNG");
    }

    #[test]
    fn test_builtin_vocabulary_has_no_duplicates() {
        let vocab = BrandVocabulary::builtin().unwrap();
        let mut lower: Vec<String> = vocab.iter().map(|b| b.name.to_lowercase()).collect();
        let total = lower.len();
        lower.sort();
        lower.dedup();
        assert_eq!(lower.len(), total);
        assert!(total < BUILTIN_BRANDS.len());
    }

    #[test]
    fn test_ram_pattern_prefers_longer_alternative() {
        assert_eq!(matches(RAM_PATTERN, "Tablet 64GB 4GB RAM"), vec!["64GB", "4GB RAM"]);
        assert_eq!(matches(RAM_PATTERN, "Celular 3 G RAM"), vec!["3 G RAM"]);
    }

    #[test]
    fn test_storage_pattern_needs_boundary_after_unit() {
        assert_eq!(matches(STORAGE_PATTERN, "Tablet 128GB 1TB"), vec!["128GB", "1TB"]);
        assert!(matches(STORAGE_PATTERN, "Tablet 128GBs").is_empty());
    }

    #[test]
    fn test_ram_fallback_ignores_gb() {
        assert_eq!(matches(RAM_FALLBACK_PATTERN, "Celular 3G 64GB 2RAM"), vec!["3G", "2RAM"]);
    }

    #[test]
    fn test_cpu_and_gpu_patterns() {
        assert_eq!(matches(CPU_PATTERN, "Notebook AMD Ryzen 5 5500U"), vec!["AMD Ryzen 5"]);
        assert_eq!(matches(CPU_PATTERN, "Intel Core i7-1255U, 16GB"), vec!["Intel Core i7-1255U"]);
        assert_eq!(matches(GPU_PATTERN, "Gamer RTX 3050 8GB")[0].trim(), "RTX 3050");
        assert_eq!(matches(GPU_PATTERN, "Intel Iris Xe 8GB")[0], "Intel Iris Xe");
    }

    #[test]
    fn test_camera_and_dual_chip_patterns() {
        assert_eq!(matches(CAMERA_PATTERN, "Câmera 50 Mpx e 8MPX"), vec!["50 Mpx", "8MPX"]);
        assert_eq!(matches(DUAL_CHIP_PATTERN, "Moto G dual chip"), vec!["dual chip"]);
        assert_eq!(matches(DUAL_CHIP_PATTERN, "Redmi DualSIM"), vec!["DualSIM"]);
    }

    #[test]
    fn test_size_templates() {
        let unit = SIZE_WITH_UNIT_TEMPLATE.replace("{value}", "50");
        let caps = regex(&unit).captures("Smart TV 50\" LG").unwrap();
        assert_eq!(&caps["span"], "50");
        assert!(regex(&unit).captures("Smart TV 50 LG").is_none());
        assert_eq!(matches(SIZE_FALLBACK_PATTERN, "TV 4K 55 UHD 2023"), vec!["55"]);
    }
}
