// SPDX-License-Identifier: MIT

//! Maestro orchestration engine.
//!
//! The services that own every mutation: project/task/session lifecycle,
//! mail with long-poll inboxes, per-session work queues, on-demand log
//! digests, and the spawn orchestrator. Services validate, mutate through
//! the repositories, and publish typed events on the in-process bus.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod digest;
pub mod locks;
pub mod services;
pub mod spawn;

pub use bus::{EventBus, SubscriptionGuard, SubscriptionId};
pub use digest::{DigestConfig, DigestEntry, DigestService, DigestState, SessionDigest, StuckInfo};
pub use locks::EntityLocks;
pub use services::Services;
pub use spawn::{
    FsManifestGenerator, ManifestGenerator, SpawnConfig, SpawnRequest, SpawnService, SpawnSource,
};

#[cfg(test)]
pub(crate) mod test_support;
