//! Omni core library — identity domain types and group-membership normalization.
//!
//! - [`types`] — newtypes, SCIM user/group structs, [`GroupCatalog`]
//! - [`normalize`] — turning the three membership encodings into a set of IDs
//! - [`error`] — [`NormalizeError`]

pub mod error;
pub mod normalize;
pub mod types;

pub use error::NormalizeError;
pub use normalize::{normalize_groups, observed_group_ids, parse_member_ids, Normalized};
pub use types::{
    Attributes, Group, GroupCatalog, GroupId, GroupIdSet, GroupUpdate, MemberRef, User, UserId,
    GROUP_SCHEMA, PATCH_OP_SCHEMA, USER_ATTRIBUTE_SCHEMA,
};
