//! Flat delimiter-based response encoding for the agent platform.
//!
//! The platform cannot reliably parse nested JSON, so results are serialized
//! as `TAG|field:value|field:value`. Sequences join their elements with `/`,
//! nested key/value pairs render as `k:v` joined with `/`, and independent
//! records are concatenated with `|||`. The format is write-only; no reverse
//! parse exists on this side.

/// A field value in its pre-rendered form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
}

impl FieldValue {
    fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join("/"),
            Self::Pairs(pairs) => pairs
                .iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect::<Vec<_>>()
                .join("/"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Encode one record: the outcome tag followed by each non-empty field in
/// the supplied order. Fields whose rendered value is empty are omitted
/// entirely, never emitted as a bare `name:`.
pub fn encode(tag: &str, fields: &[(&str, FieldValue)]) -> String {
    let mut out = String::from(tag);
    for (name, value) in fields {
        let rendered = value.render();
        if rendered.is_empty() {
            continue;
        }
        out.push('|');
        out.push_str(name);
        out.push(':');
        out.push_str(&rendered);
    }
    out
}

/// Join independently encoded records in place of a container.
pub fn join_blocks(blocks: &[String]) -> String {
    blocks.join("|||")
}

#[cfg(test)]
mod tests {
    use super::{encode, join_blocks, FieldValue};

    #[test]
    fn tag_then_fields_in_supplied_order() {
        let encoded = encode(
            "PRODOTTO_TROVATO",
            &[("nome", "Sedia Luna".into()), ("prezzo", "100-500€".into())],
        );
        assert_eq!(encoded, "PRODOTTO_TROVATO|nome:Sedia Luna|prezzo:100-500€");
    }

    #[test]
    fn empty_fields_are_omitted_entirely() {
        let encoded = encode("X", &[("a", "".into()), ("b", "v".into())]);
        assert_eq!(encoded, "X|b:v");
    }

    #[test]
    fn empty_list_is_omitted() {
        let encoded = encode("X", &[("bot", FieldValue::List(Vec::new()))]);
        assert_eq!(encoded, "X");
    }

    #[test]
    fn list_elements_join_with_slash() {
        let encoded = encode(
            "X",
            &[("bot", FieldValue::List(vec!["hi".to_string(), "there".to_string()]))],
        );
        assert_eq!(encoded, "X|bot:hi/there");
    }

    #[test]
    fn pairs_render_as_inner_key_value() {
        let encoded = encode(
            "X",
            &[(
                "finiture",
                FieldValue::Pairs(vec![
                    ("Noce".to_string(), "50".to_string()),
                    ("Rovere".to_string(), "80".to_string()),
                ]),
            )],
        );
        assert_eq!(encoded, "X|finiture:Noce:50/Rovere:80");
    }

    #[test]
    fn blocks_join_with_triple_pipe() {
        let blocks = vec!["A|x:1".to_string(), "A|x:2".to_string()];
        assert_eq!(join_blocks(&blocks), "A|x:1|||A|x:2");
    }
}
