/// Application name
pub const APP_NAME: &str = "MONKey";

/// Number of distinct delete votes that removes a task
pub const DEFAULT_DELETE_QUORUM: usize = 3;

/// Smallest point value a task may carry
pub const MIN_TASK_POINTS: u32 = 1;

/// Largest point value a task may carry
pub const MAX_TASK_POINTS: u32 = 100;

/// Messages surfaced by the chatroom listing
pub const DEFAULT_MESSAGE_LIST_LIMIT: usize = 100;

/// Category given to resources created without one
pub const DEFAULT_RESOURCE_CATEGORY: &str = "Other";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Calendar date format used by completions (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";
