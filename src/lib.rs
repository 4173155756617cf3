//! # Stowage
//!
//! A client core for a remote content store. Stowage tracks the files it has
//! placed on the remote, detects duplicate content before transmitting bytes,
//! keeps sleep-on-idle backends warm with background health probes, and
//! surfaces notifications through a tiered fallback chain that never fails.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌────────────────┐
//! │  digest  │──▶│  registry  │──▶│   reconcile    │──▶ merged file view
//! │ SHA-256  │   │ JSON store │   │ remote ⊕ local │
//! └──────────┘   └────────────┘   └───────┬────────┘
//!                                         │
//!                  ┌──────────────────────┤
//!                  ▼                      ▼
//!            ┌──────────┐          ┌──────────┐
//!            │  health  │          │  notify  │
//!            │  probes  │          │ 3 tiers  │
//!            └──────────┘          └──────────┘
//! ```
//!
//! The remote store is reached through the [`remote::RemoteStore`] trait, so
//! every flow that touches the network can be exercised against a scripted
//! implementation in tests. All errors crossing the remote boundary are
//! classified into [`error::RemoteError`] — the core never leaks raw
//! transport failures to its callers.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Classified remote-call errors |
//! | [`digest`] | Chunked SHA-256 content fingerprints |
//! | [`store`] | Fail-soft JSON record stores |
//! | [`registry`] | Local upload registry |
//! | [`settings`] | Persisted user settings |
//! | [`activity`] | Capped activity feed |
//! | [`remote`] | Remote store client and trait seam |
//! | [`assistant`] | Assistant chat passthrough |
//! | [`reconcile`] | Remote/local view reconciliation |
//! | [`health`] | Background endpoint health monitor |
//! | [`notify`] | Tiered notification dispatcher |
//! | [`transfer`] | Upload/download/delete orchestration |

pub mod activity;
pub mod assistant;
pub mod config;
pub mod digest;
pub mod error;
pub mod health;
pub mod notify;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod settings;
pub mod store;
pub mod transfer;
