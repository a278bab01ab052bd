//! Deterministic text normalization shared by training and prediction.
//!
//! lowercase → strip ASCII punctuation → split on whitespace → drop
//! Portuguese stopwords → Snowball stem → join with single spaces.

use std::collections::HashSet;
use std::sync::LazyLock;

use rust_stemmers::{Algorithm, Stemmer};

/// Portuguese stopwords (the NLTK list).
const STOPWORDS_PT: &[&str] = &[
    "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às",
    "até", "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do",
    "dos", "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "éramos",
    "essa", "essas", "esse", "esses", "esta", "está", "estamos", "estão", "estar", "estas",
    "estava", "estavam", "estávamos", "este", "esteja", "estejam", "estejamos", "estes",
    "esteve", "estive", "estivemos", "estiver", "estivera", "estiveram", "estivéramos",
    "estiverem", "estivermos", "estivesse", "estivessem", "estivéssemos", "estou", "eu", "foi",
    "fomos", "for", "fora", "foram", "fôramos", "forem", "formos", "fosse", "fossem",
    "fôssemos", "fui", "há", "haja", "hajam", "hajamos", "hão", "havemos", "haver", "hei",
    "houve", "houvemos", "houver", "houvera", "houverá", "houveram", "houvéramos", "houverão",
    "houverei", "houverem", "houveremos", "houveria", "houveriam", "houveríamos", "houvermos",
    "houvesse", "houvessem", "houvéssemos", "isso", "isto", "já", "lhe", "lhes", "mais", "mas",
    "me", "mesmo", "meu", "meus", "minha", "minhas", "muito", "na", "não", "nas", "nem", "no",
    "nos", "nós", "nossa", "nossas", "nosso", "nossos", "num", "numa", "o", "os", "ou", "para",
    "pela", "pelas", "pelo", "pelos", "por", "qual", "quando", "que", "quem", "são", "se",
    "seja", "sejam", "sejamos", "sem", "ser", "será", "serão", "serei", "seremos", "seria",
    "seriam", "seríamos", "seu", "seus", "só", "somos", "sou", "sua", "suas", "também", "te",
    "tem", "tém", "temos", "tenha", "tenham", "tenhamos", "tenho", "terá", "terão", "terei",
    "teremos", "teria", "teriam", "teríamos", "teu", "teus", "teve", "tinha", "tinham",
    "tínhamos", "tive", "tivemos", "tiver", "tivera", "tiveram", "tivéramos", "tiverem",
    "tivermos", "tivesse", "tivessem", "tivéssemos", "tu", "tua", "tuas", "um", "uma", "você",
    "vocês", "vos",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS_PT.iter().copied().collect());

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::Portuguese));

/// Returns true if `word` (already lowercased) is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Normalize raw text into a space-joined string of stemmed tokens.
///
/// Never fails; text made only of stopwords or punctuation yields `""`.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        assert_eq!(normalize("Teste"), normalize("teste"));
        assert_eq!(normalize("RELATÓRIO Mensal"), normalize("relatório mensal"));
    }

    #[test]
    fn strips_punctuation_inside_and_around_tokens() {
        assert_eq!(normalize("prazo!!!"), normalize("prazo"));
        assert_eq!(normalize("(urgente)"), normalize("urgente"));
        assert_eq!(normalize("e-mail"), normalize("email"));
    }

    #[test]
    fn removes_stopwords() {
        let out = normalize("o relatório de vendas");
        assert!(!out.split(' ').any(|t| t == "o" || t == "de"));
        assert_eq!(out.split(' ').count(), 2);
    }

    #[test]
    fn stopword_only_input_is_empty() {
        assert_eq!(normalize("que de para o a"), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("?!... ,,"), "");
    }

    #[test]
    fn joins_with_single_spaces_in_order() {
        let out = normalize("  prazo    urgente\n\nprojeto ");
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| !t.is_empty()));
        assert_eq!(tokens[0], normalize("prazo"));
        assert_eq!(tokens[2], normalize("projeto"));
    }

    #[test]
    fn idempotent_on_stable_stems() {
        let once = normalize("Prazo urgente");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn stems_plural_forms_together() {
        assert_eq!(normalize("projetos"), normalize("projeto"));
    }

    #[test]
    fn stopword_lookup() {
        assert!(is_stopword("você"));
        assert!(!is_stopword("reunião"));
    }
}
