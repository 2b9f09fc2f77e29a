//! Knowledge-base search: criteria matching over a fetched record set.
//!
//! All active criteria combine with logical AND. The engine is a pure
//! transformation: it never mutates the source slice and assumes the caller
//! already holds a consistent snapshot from the record store.

use crate::domain::knowledge::KnowledgeItem;
use crate::search::range::parse_range;

/// Recognized search criteria. Absent options apply no filtering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Exact category match, case-insensitive.
    pub tipo: Option<String>,
    /// Case-insensitive substring match against `nome`.
    pub nome: Option<String>,
    /// Delivery-time containment value in days.
    pub consegna: Option<i64>,
    /// Price containment value.
    pub prezzo: Option<i64>,
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        self.tipo.is_none()
            && self.nome.is_none()
            && self.consegna.is_none()
            && self.prezzo.is_none()
    }
}

/// Return the subset of `items` matching `criteria`, by value.
///
/// A record whose range field does not parse is excluded only while the
/// corresponding filter is active; with the filter inactive the field is
/// never inspected.
pub fn search(items: &[KnowledgeItem], criteria: &SearchCriteria) -> Vec<KnowledgeItem> {
    items.iter().filter(|item| matches(item, criteria)).cloned().collect()
}

fn matches(item: &KnowledgeItem, criteria: &SearchCriteria) -> bool {
    if let Some(tipo) = &criteria.tipo {
        if item.tipo.to_lowercase() != tipo.to_lowercase() {
            return false;
        }
    }

    if let Some(nome) = &criteria.nome {
        if !item.nome.to_lowercase().contains(&nome.to_lowercase()) {
            return false;
        }
    }

    if let Some(value) = criteria.consegna {
        if !range_field_contains(&item.consegna, value) {
            return false;
        }
    }

    if let Some(value) = criteria.prezzo {
        if !range_field_contains(&item.prezzo, value) {
            return false;
        }
    }

    true
}

fn range_field_contains(field: &str, value: i64) -> bool {
    parse_range(field).is_some_and(|range| range.contains(value))
}

#[cfg(test)]
mod tests {
    use super::{search, SearchCriteria};
    use crate::domain::knowledge::{KnowledgeId, KnowledgeItem};

    fn item(nome: &str, tipo: &str, prezzo: &str, consegna: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: KnowledgeId::generate(),
            tipo: tipo.to_string(),
            nome: nome.to_string(),
            descrizione: Some(format!("{nome} di prova")),
            prezzo: prezzo.to_string(),
            consegna: consegna.to_string(),
            domande: Vec::new(),
            domande_finali: Vec::new(),
            categorie: Vec::new(),
            domande_categorie: Vec::new(),
            finiture: Vec::new(),
            domande_finiture: Vec::new(),
        }
    }

    fn catalog() -> Vec<KnowledgeItem> {
        vec![
            item("Sedia Luna", "arredo", "100-500", "30-60 giorni"),
            item("Lampada Sole", "illuminazione", "250€", "45 giorni"),
            item("Tavolo Mare", "arredo", "su richiesta", ""),
        ]
    }

    #[test]
    fn no_criteria_returns_all_records_by_value() {
        let records = catalog();
        let found = search(&records, &SearchCriteria::default());
        assert_eq!(found, records);
    }

    #[test]
    fn result_is_always_a_subset() {
        let records = catalog();
        let found = search(
            &records,
            &SearchCriteria { tipo: Some("arredo".to_string()), ..Default::default() },
        );
        assert!(found.iter().all(|f| records.contains(f)));
    }

    #[test]
    fn tipo_is_exact_equality_not_substring() {
        let records = catalog();
        let found = search(
            &records,
            &SearchCriteria { tipo: Some("arred".to_string()), ..Default::default() },
        );
        assert!(found.is_empty());

        let found = search(
            &records,
            &SearchCriteria { tipo: Some("ARREDO".to_string()), ..Default::default() },
        );
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn nome_is_case_insensitive_substring() {
        let records = catalog();
        let found = search(
            &records,
            &SearchCriteria { nome: Some("luna".to_string()), ..Default::default() },
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nome, "Sedia Luna");
    }

    #[test]
    fn price_containment_respects_both_bounds() {
        let records = vec![item("Sedia", "arredo", "100-500", "")];

        let inside =
            search(&records, &SearchCriteria { prezzo: Some(300), ..Default::default() });
        assert_eq!(inside.len(), 1);

        let below = search(&records, &SearchCriteria { prezzo: Some(50), ..Default::default() });
        assert!(below.is_empty());

        let above = search(&records, &SearchCriteria { prezzo: Some(600), ..Default::default() });
        assert!(above.is_empty());
    }

    #[test]
    fn unparseable_range_excludes_only_when_filter_active() {
        let records = catalog();

        let with_price =
            search(&records, &SearchCriteria { prezzo: Some(300), ..Default::default() });
        assert!(with_price.iter().all(|f| f.nome != "Tavolo Mare"));

        let without_price = search(
            &records,
            &SearchCriteria { tipo: Some("arredo".to_string()), ..Default::default() },
        );
        assert!(without_price.iter().any(|f| f.nome == "Tavolo Mare"));
    }

    #[test]
    fn active_filters_combine_with_and() {
        let records = catalog();
        let found = search(
            &records,
            &SearchCriteria {
                tipo: Some("arredo".to_string()),
                nome: Some("sedia".to_string()),
                consegna: Some(40),
                prezzo: Some(200),
            },
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nome, "Sedia Luna");
    }

    #[test]
    fn negative_values_compare_as_given() {
        let records = vec![item("Sedia", "arredo", "100-500", "")];
        let found =
            search(&records, &SearchCriteria { prezzo: Some(-10), ..Default::default() });
        assert!(found.is_empty());
    }
}
