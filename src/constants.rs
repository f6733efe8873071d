// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Reading these constants should tell you how a sync run behaves: how much
//! it asks for per page, how long it waits, and which payload shapes it
//! treats as special.

// ---------------------------------------------------------------------------
// Vista API boundaries
// ---------------------------------------------------------------------------

/// How many listings are requested per page of the listing endpoint.
pub const LISTING_PAGE_SIZE: u32 = 50;

/// Seconds before an API or store request is abandoned.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Keys of a listing page that carry pagination metadata instead of items.
pub const RESERVED_PAGE_KEYS: &[&str] = &["total", "paginas", "pagina", "quantidade"];

/// Member of a detail response that holds the child records.
pub const HISTORY_FIELD: &str = "prontuarios";

/// A 400 whose body mentions this word means "listing has no history".
pub const NO_HISTORY_MARKER: &str = "prontuarios";

/// Body text the API sends when it is shedding connections.
pub const TOO_MANY_CONNECTIONS_MARKER: &str = "too many connections";

/// Fields requested by the listing sync.
pub const LISTING_SYNC_FIELDS: &[&str] = &[
    "Codigo",
    "Categoria",
    "Bairro",
    "Status",
    "Orulo",
    "DataCadastro",
    "DataDeAtivacao",
    "DataAtualizacao",
    "ExibirNoSite",
];

/// Fields requested by the CSV snapshot export.
pub const LISTING_EXPORT_FIELDS: &[&str] = &[
    "Codigo",
    "Categoria",
    "Bairro",
    "Status",
    "Orulo",
    "DataHoraAtualizacao",
    "PendenteProntuario",
    "DataDeAtivacao",
    "DataAtualizacao",
];

/// Fields requested inside the `prontuarios` block of a detail request.
pub const HISTORY_FIELDS: &[&str] = &[
    "Data",
    "Hora",
    "Assunto",
    "Texto",
    "Pendente",
    "Bairro",
    "Anunciado",
    "Retranca",
    "Corretor",
    "PROPOSTA",
    "Status",
    "Datainicio",
    "VeiculoPublicado",
    "ValorProposta",
    "BairroAnuncio",
    "StatusBatecao",
    "ValorBatido",
    "Privado",
    "Cliente",
    "Tipoanuncio",
    "Titulado",
    "Statusdoimóvel",
    "CodigoCorretor",
];

// ---------------------------------------------------------------------------
// Retry and pacing
// ---------------------------------------------------------------------------

/// Attempts per remote call before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Seconds added per attempt when the API reports rate limiting.
pub const RATE_LIMIT_BACKOFF_STEP_SECS: u64 = 5;

/// Base seconds of the generic backoff (`base + step × attempt`).
pub const GENERIC_BACKOFF_BASE_SECS: u64 = 1;

/// Seconds added per attempt by the generic backoff.
pub const GENERIC_BACKOFF_STEP_SECS: u64 = 2;

/// Default pause after each per-listing detail request.
pub const DEFAULT_PACING_SECS: f64 = 0.4;

/// Upper bound for phase-2 parallelism.
pub const MAX_CONCURRENCY: usize = 16;

// ---------------------------------------------------------------------------
// Store boundaries
// ---------------------------------------------------------------------------

/// Rows read per request when enumerating listing codes.
pub const STORE_READ_PAGE_SIZE: u32 = 1000;

/// Rows written per upsert request.
pub const UPSERT_BATCH_SIZE: usize = 500;

/// Default listings table.
pub const LISTINGS_TABLE: &str = "imoveis";

/// Default history table.
pub const HISTORY_TABLE: &str = "imovel_prontuario";

/// Default listing identity column.
pub const LISTING_IDENTITY_COLUMN: &str = "codigo";

/// Composite conflict key of the history table.
pub const HISTORY_CONFLICT_COLUMNS: &[&str] = &["codigo_imovel", "codigo_prontuario"];

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters kept from an undecodable response body.
pub const DECODE_SNIPPET_LENGTH: usize = 1000;

/// Maximum characters shown when logging a failed attempt.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
