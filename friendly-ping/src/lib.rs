//! Push-messaging relay that lets clients discover and ping each other.
//!
//! See `README.md` for usage and the message protocol. Each module focuses on
//! a concrete responsibility:
//!
//! - [`client`] defines the client record and the relay's own identity.
//! - [`directory`] keeps registered clients behind a reader/writer lock.
//! - [`message`] decodes and validates upstream data maps by action.
//! - [`notification`] builds the outbound messages for each action.
//! - [`transport`] is the seam to the push backend; [`gcm`] implements it
//!   over HTTP.
//! - [`reconcile`] folds canonical addresses reported by the backend back
//!   into the directory.
//! - [`relay`] dispatches upstream messages to the registration and ping
//!   handlers.
//! - [`fixture`] loads seed clients; [`inbound`] exposes the upstream HTTP
//!   endpoint; [`cli`] parses the command line.
//!
//! Unit tests live next to each module; integration tests drive the relay
//! through its HTTP surfaces.

pub mod cli;
pub mod client;
pub mod directory;
pub mod error;
pub mod fixture;
pub mod gcm;
pub mod inbound;
pub mod message;
pub mod notification;
pub mod reconcile;
pub mod relay;
pub mod transport;
