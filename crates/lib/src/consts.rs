pub const APP_NAME: &str = "catsync";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CATSYNC_DATA_DIR";

/// Namespace that templates of global catalogs live in.
pub const GLOBAL_NAMESPACE: &str = "cattle-global-data";

/// Message carried by the refreshed condition while a sync is in flight.
pub const SYNCING_MESSAGE: &str = "syncing catalog";

/// Maximum length of a generated template name.
pub const TEMPLATE_NAME_MAX_LEN: usize = 63;

/// Length of the hash suffix appended to truncated template names.
pub const NAME_HASH_SUFFIX_LEN: usize = 8;

/// Descriptor files read from each release, matched case-insensitively.
pub const SUPPORTED_DESCRIPTOR_FILES: &[&str] = &["catalog.yml", "catalog.yaml", "questions.yml", "questions.yaml"];
