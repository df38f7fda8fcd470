//! Perspective resources (views, style classes, page config, session props).
//!
//! Perspective resources are project-scoped and not exposed by the gateway's
//! resource API, so every read goes through a project export and every
//! write through a full export/import round trip (see [`crate::archive`]).

mod kind;
mod metadata;
mod ops;

pub use kind::{PERSPECTIVE_NAMESPACE, RESOURCE_META_FILE, ResourceKind, validate_identifier};
pub use metadata::{
    EXTERNAL_ACTOR, LastModification, ResourceAttributes, ResourceMeta, audit_timestamp,
    refresh_audit,
};
pub use ops::{
    PageRoute, create_resource, delete_resource, list_ids, page_routes, update_resource,
    write_json,
};
