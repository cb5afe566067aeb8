/// Constants used throughout the savepoint codebase
// Reserved identifier suffixes
pub const META_SUFFIX: &str = ".meta";
pub const BACKUP_SUFFIX: &str = ".backup";
pub const TEMP_SUFFIX: &str = ".tmpsave";

// The catalog is persisted as a regular item under this reserved identifier
pub const CATALOG_ID: &str = ".catalog";

// Well-known metadata keys
pub const META_CREATION_TIME: &str = "CreationTimeUtc";
pub const META_MODIFICATION_TIME: &str = "LastModificationTimeUtc";
pub const META_ACCESS_TIME: &str = "LastAccessTimeUtc";
pub const META_ENCRYPTED: &str = "Encrypted";
pub const META_APPLICATION_VERSION: &str = "ApplicationVersion";
pub const META_BACKUPS: &str = "Backups";
