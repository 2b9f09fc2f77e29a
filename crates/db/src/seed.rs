//! Deterministic demo fixtures for local development and walkthroughs.
//!
//! Records carry fixed ids so repeated runs converge on the same state
//! instead of piling up duplicates.

use arreda_core::domain::client::{ClientId, ClientPatch};
use arreda_core::domain::knowledge::{Categoria, Finitura, KnowledgeId, KnowledgeItem};

use crate::repositories::{
    ClientRepository, KnowledgeRepository, RepositoryError, SqlClientRepository,
    SqlKnowledgeRepository,
};
use crate::DbPool;

pub const DEMO_CLIENT_EXTERNAL_ID: &str = "demo-voiceflow";

pub struct DemoDataset;

pub struct SeedSummary {
    pub knowledge_items: usize,
    pub clients: usize,
}

pub struct SeedVerification {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

fn demo_items() -> Vec<KnowledgeItem> {
    vec![
        KnowledgeItem {
            id: KnowledgeId("demo-sedia-luna".to_string()),
            tipo: "arredo".to_string(),
            nome: "Sedia Luna".to_string(),
            descrizione: Some("Sedia in rovere massello con seduta imbottita".to_string()),
            prezzo: "100-500€".to_string(),
            consegna: "30-60 giorni".to_string(),
            domande: vec!["Che stile preferisci per la tua sedia?".to_string()],
            domande_finali: vec!["Vuoi ricevere un preventivo dettagliato?".to_string()],
            categorie: vec![
                Categoria {
                    titolo: "Classico".to_string(),
                    descrizione: "Linee tradizionali e legni caldi".to_string(),
                },
                Categoria {
                    titolo: "Moderno".to_string(),
                    descrizione: "Profili essenziali e tinte neutre".to_string(),
                },
            ],
            domande_categorie: vec!["Quale categoria ti rappresenta di più?".to_string()],
            finiture: Vec::new(),
            domande_finiture: Vec::new(),
        },
        KnowledgeItem {
            id: KnowledgeId("demo-tavolo-mare".to_string()),
            tipo: "arredo".to_string(),
            nome: "Tavolo Mare".to_string(),
            descrizione: Some("Tavolo allungabile per sei-dieci persone".to_string()),
            prezzo: "700-1500€".to_string(),
            consegna: "60-90 giorni".to_string(),
            domande: vec!["Quante persone deve ospitare il tavolo?".to_string()],
            domande_finali: Vec::new(),
            categorie: Vec::new(),
            domande_categorie: Vec::new(),
            finiture: Vec::new(),
            domande_finiture: Vec::new(),
        },
        KnowledgeItem {
            id: KnowledgeId("demo-lampada-sole".to_string()),
            tipo: "complemento d'arredo".to_string(),
            nome: "Lampada Sole".to_string(),
            descrizione: Some("Lampada da terra orientabile in ottone".to_string()),
            prezzo: "80-200€".to_string(),
            consegna: "15 giorni".to_string(),
            domande: Vec::new(),
            domande_finali: Vec::new(),
            categorie: Vec::new(),
            domande_categorie: Vec::new(),
            finiture: vec![Finitura {
                titolo: "Ottone spazzolato".to_string(),
                descrizione: "Finitura opaca anti impronta".to_string(),
                prezzo: "30€".to_string(),
            }],
            domande_finiture: vec!["Quale finitura preferisci?".to_string()],
        },
    ]
}

impl DemoDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        let knowledge = SqlKnowledgeRepository::new(pool.clone());
        let clients = SqlClientRepository::new(pool.clone());

        let items = demo_items();
        let knowledge_count = items.len();
        for item in items {
            if !knowledge.update(item.clone()).await? {
                knowledge.insert(item).await?;
            }
        }

        let patch = ClientPatch {
            nome: Some("Cliente Demo".to_string()),
            numero: Some("333 0000000".to_string()),
            summary: Some("Cliente di esempio per le prove locali".to_string()),
        };
        clients.upsert_by_external_id(DEMO_CLIENT_EXTERNAL_ID, patch).await?;

        Ok(SeedSummary { knowledge_items: knowledge_count, clients: 1 })
    }

    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, RepositoryError> {
        let knowledge = SqlKnowledgeRepository::new(pool.clone());
        let clients = SqlClientRepository::new(pool.clone());

        let mut checks = Vec::new();
        for id in ["demo-sedia-luna", "demo-tavolo-mare", "demo-lampada-sole"] {
            let present = knowledge.find_by_id(&KnowledgeId(id.to_string())).await?.is_some();
            checks.push((knowledge_check_name(id), present));
        }

        let client_present =
            clients.find_by_id(&ClientId(DEMO_CLIENT_EXTERNAL_ID.to_string())).await?.is_some();
        checks.push(("demo-client", client_present));

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(SeedVerification { all_present, checks })
    }
}

fn knowledge_check_name(id: &str) -> &'static str {
    match id {
        "demo-sedia-luna" => "knowledge-sedia-luna",
        "demo-tavolo-mare" => "knowledge-tavolo-mare",
        _ => "knowledge-lampada-sole",
    }
}
