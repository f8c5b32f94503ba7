//! # omni-client
//!
//! Identity API access for `omni-user-manager`.
//!
//! [`IdentityApi`] is the contract the reconciliation side depends on;
//! [`OmniClient`] implements it over SCIM 2.0 with a blocking HTTP agent.
//! Tests substitute their own implementation.

mod client;
pub mod config;
mod error;
pub mod scim;

use omni_core::{Attributes, Group, GroupUpdate, User, UserId};

pub use client::OmniClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};

/// Operations the sync needs from the identity platform.
pub trait IdentityApi {
    /// Every group with its full member list.
    fn get_groups(&self) -> Result<Vec<Group>, ApiError>;

    /// The user with this `userName`, or `None` if the platform has none.
    fn get_user(&self, user_name: &str) -> Result<Option<User>, ApiError>;

    /// Replace a group's display name and whole member list.
    fn update_group(&self, update: &GroupUpdate) -> Result<(), ApiError>;

    /// Replace a user's custom attributes.
    fn update_user_attributes(
        &self,
        user_id: &UserId,
        attributes: &Attributes,
    ) -> Result<(), ApiError>;
}
