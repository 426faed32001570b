//! Control-socket protocol subsystem.
//!
//! Text line protocol between the Controller and local clients (the web
//! dashboard, the `send` sub-command).
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Control socket stack                     │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌────────────────────────┐ │
//! │  │ Transport │──▶│  Codec   │──▶│  Request (parse)       │ │
//! │  │ (accept)  │   │ (line)   │   └───────────┬────────────┘ │
//! │  └───────────┘   └──────────┘               ▼              │
//! │       ▲                         ┌────────────────────────┐ │
//! │       │                         │ Engine (dispatch)      │ │
//! │       └──────── one reply ◀─────│  → channels, scheduler │ │
//! │                 line, close     └────────────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod codec;
pub mod engine;
pub mod request;
pub mod transport;
