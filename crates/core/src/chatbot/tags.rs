//! Outcome tags understood by the agent platform's flow definitions.
//!
//! Keep these stable: the platform branches on the literal strings.

pub const PRODOTTO_TROVATO: &str = "PRODOTTO_TROVATO";
pub const NESSUN_PRODOTTO_TROVATO: &str = "NESSUN_PRODOTTO_TROVATO";
pub const TIPO_MANCANTE: &str = "TIPO_MANCANTE";

pub const CLIENTE_TROVATO: &str = "CLIENTE_TROVATO";
pub const CLIENTE_NON_TROVATO: &str = "CLIENTE_NON_TROVATO";
pub const CLIENTE_AGGIORNATO: &str = "CLIENTE_AGGIORNATO";
pub const CONVERSAZIONE_SALVATA: &str = "CONVERSAZIONE_SALVATA";
pub const ID_VOICEFLOW_MANCANTE: &str = "ID_VOICEFLOW_MANCANTE";

pub const API_KEY_NON_VALIDA: &str = "API_KEY_NON_VALIDA";
pub const ERRORE_INTERNO: &str = "ERRORE_INTERNO";
