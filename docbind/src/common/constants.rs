/// Name of the identity entry in a stored document.
pub const DOC_ID: &str = "_id";

/// Key of the extended-JSON identity wrapper, `{$oid: "<hex>"}`.
pub const OID: &str = "$oid";

/// Placeholder token used by the binder unless another one is configured.
pub const DEFAULT_PLACEHOLDER: char = '#';

/// Separator for embedded field paths, e.g. `address.city`.
pub const FIELD_SEPARATOR: &str = ".";

pub const OBJECT_ID_LENGTH: usize = 12;
pub const OBJECT_ID_HEX_LENGTH: usize = 24;
