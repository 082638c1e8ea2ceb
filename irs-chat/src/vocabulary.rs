//! Word lists the extractor recognises.
//!
//! A [`Vocabulary`] is configuration: the built-in Portuguese lists are the
//! [`Default`], and any subset can be overridden from a TOML file (see
//! `irs-data`). Entries are literal phrases written in the folded form
//! produced by [`crate::text::normalize_text`] (lowercase, no accents).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeVocabulary {
    /// Verbs that introduce an amount ("ganho 1500").
    pub employment_verbs: Vec<String>,
    /// Nouns that may follow an amount ("1500 de salario").
    pub employment_nouns: Vec<String>,
    pub independent_verbs: Vec<String>,
    pub independent_nouns: Vec<String>,
    pub pension: Vec<String>,
    pub subsidies: Vec<String>,
    pub withholding: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CivilStatusVocabulary {
    /// Negated partner phrases, read as single.
    pub negated_partner: Vec<String>,
    pub widowed: Vec<String>,
    pub divorced: Vec<String>,
    pub married: Vec<String>,
    pub single: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependentVocabulary {
    pub plural_nouns: Vec<String>,
    pub singular_nouns: Vec<String>,
    /// Phrases that assert one dependent on their own ("filha unica").
    pub only_child: Vec<String>,
    /// Phrases placed before a noun to deny having any ("nao tenho").
    pub negations: Vec<String>,
    pub disability: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseVocabulary {
    pub health: Vec<String>,
    pub education: Vec<String>,
    pub housing: Vec<String>,
    pub donations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeVocabulary {
    pub organized: Vec<String>,
    pub simplified: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub income: IncomeVocabulary,
    pub civil_status: CivilStatusVocabulary,
    pub dependents: DependentVocabulary,
    pub expenses: ExpenseVocabulary,
    pub regime: RegimeVocabulary,
    pub monthly: Vec<String>,
    pub annual: Vec<String>,
    pub currency: Vec<String>,
    /// Words that multiply the preceding amount by 1000.
    pub thousands: Vec<String>,
    /// Counting words and their values.
    pub number_words: BTreeMap<String, u32>,
    /// Bare replies that decline a question ("nenhum", "nao").
    pub declines: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for IncomeVocabulary {
    fn default() -> Self {
        Self {
            employment_verbs: words(&[
                "ganho", "ganha", "ganhamos", "recebo", "recebe", "recebemos", "aufiro",
            ]),
            employment_nouns: words(&[
                "salario",
                "salarios",
                "ordenado",
                "vencimento",
                "remuneracao",
                "rendimento",
                "rendimentos",
            ]),
            independent_verbs: words(&["faturo", "fatura", "faturei", "faturamos"]),
            independent_nouns: words(&[
                "recibos verdes",
                "recibo verde",
                "freelancer",
                "freelance",
                "autonomo",
                "autonoma",
                "trabalhador independente",
                "trabalhadora independente",
                "trabalho independente",
                "prestacao de servicos",
            ]),
            pension: words(&["reforma", "reformado", "reformada", "pensao", "pensionista"]),
            subsidies: words(&[
                "subsidio de ferias",
                "subsidio de natal",
                "subsidios",
                "subsidio",
            ]),
            withholding: words(&[
                "retencao na fonte",
                "retencoes na fonte",
                "retencao",
                "retencoes",
                "retido",
                "retidos",
                "imposto retido",
            ]),
        }
    }
}

impl Default for CivilStatusVocabulary {
    fn default() -> Self {
        Self {
            negated_partner: words(&[
                "nao tenho conjuge",
                "nao tenho companheiro",
                "nao tenho companheira",
                "nao tenho marido",
                "nao tenho mulher",
                "nao sou casado",
                "nao sou casada",
                "sem conjuge",
            ]),
            widowed: words(&["viuvo", "viuva", "enviuvei"]),
            divorced: words(&[
                "divorciado",
                "divorciada",
                "divorciei",
                "separado",
                "separada",
            ]),
            married: words(&[
                "casado",
                "casada",
                "casados",
                "casei",
                "uniao de facto",
                "conjuge",
                "minha mulher",
                "meu marido",
                "minha esposa",
                "meu esposo",
            ]),
            single: words(&["solteiro", "solteira", "sozinho", "sozinha"]),
        }
    }
}

impl Default for DependentVocabulary {
    fn default() -> Self {
        Self {
            plural_nouns: words(&[
                "filhos",
                "filhas",
                "dependentes",
                "criancas",
                "menores",
                "enteados",
            ]),
            singular_nouns: words(&["filho", "filha", "dependente", "crianca", "enteado"]),
            only_child: words(&["filho unico", "filha unica"]),
            negations: words(&["nao tenho", "sem", "nenhum", "nenhuma", "zero"]),
            disability: words(&[
                "com deficiencia",
                "deficiente",
                "deficientes",
                "com incapacidade",
                "portador de deficiencia",
            ]),
        }
    }
}

impl Default for ExpenseVocabulary {
    fn default() -> Self {
        Self {
            health: words(&[
                "saude",
                "despesas medicas",
                "medico",
                "medicos",
                "medicamentos",
                "farmacia",
                "hospital",
                "consultas",
                "consulta",
                "dentista",
                "seguro de saude",
            ]),
            education: words(&[
                "educacao",
                "escola",
                "escolas",
                "propinas",
                "propina",
                "universidade",
                "faculdade",
                "mensalidade",
                "mensalidades",
                "colegio",
                "creche",
                "explicacoes",
                "manuais escolares",
            ]),
            housing: words(&[
                "renda",
                "rendas",
                "casa",
                "habitacao",
                "arrendamento",
                "aluguer",
                "credito habitacao",
                "prestacao da casa",
            ]),
            donations: words(&["donativos", "donativo", "doacoes", "doacao"]),
        }
    }
}

impl Default for RegimeVocabulary {
    fn default() -> Self {
        Self {
            organized: words(&["contabilidade organizada", "regime organizado"]),
            simplified: words(&["regime simplificado", "simplificado"]),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        let number_words = [
            ("um", 1),
            ("uma", 1),
            ("dois", 2),
            ("duas", 2),
            ("tres", 3),
            ("quatro", 4),
            ("cinco", 5),
            ("seis", 6),
        ]
        .into_iter()
        .map(|(word, value)| (word.to_string(), value))
        .collect();

        Self {
            income: IncomeVocabulary::default(),
            civil_status: CivilStatusVocabulary::default(),
            dependents: DependentVocabulary::default(),
            expenses: ExpenseVocabulary::default(),
            regime: RegimeVocabulary::default(),
            monthly: words(&[
                "mes",
                "meses",
                "mensal",
                "mensais",
                "mensalmente",
                "mensalidade",
                "mensalidades",
            ]),
            annual: words(&["ano", "anual", "anuais", "anualmente"]),
            currency: words(&["€", "euros", "euro", "eur"]),
            thousands: words(&["mil"]),
            number_words,
            declines: words(&["nao", "nenhum", "nenhuma", "nada", "zero", "sem"]),
        }
    }
}

impl Vocabulary {
    /// Value of a counting word, if known.
    pub fn number_word(
        &self,
        word: &str,
    ) -> Option<u32> {
        self.number_words.get(word).copied()
    }
}
