pub mod audit;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod ingest;
pub mod matcher;
pub mod metrics;
pub mod rotation;
pub mod sign;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, DisabledAuthenticator, SharedSecretAuthenticator,
    UploadAuthenticator, UploadSession, Uploader,
};
pub use catalog::{AssetSpec, MediaKind, MovieProfile, ProfileCatalog, ProfileId};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ConfigSnapshot,
    ConfigStore, SanitizedConfig,
};
pub use ingest::{IngestError, IngestGateway, IngestReceipt, ParseError, Routing, ShowEvent, ShowRouter};
pub use matcher::{PatternError, WildcardPattern};
pub use rotation::{DisplayMode, RenderDirective, RotationScheduler, RotationState};
pub use sign::{
    ActiveShowState, RenderSink, SignController, SignError, SignFleet, SignHandle, SignStatus,
    Transition,
};
