//! Intermediate representation shared by elaboration, generation and simulation.
//!
//! The flattened design lives in a [`Design`]: an arena of [`Operand`]s
//! addressed by [`OperandId`], the physical [`PartSpec`]s requested by
//! built-in modules, and the top-level ports. The physical side produced by
//! generation ([`Network`]s, [`Component`]s, the top-level [`Connector`]) is
//! defined here too so that reporting code only needs this crate.
//!
//! The [`ast`] and [`token`] modules describe the parser output consumed by
//! elaboration.

#![warn(missing_docs)]

pub mod arena;
pub mod ast;
pub mod component;
pub mod design;
pub mod error;
pub mod ids;
pub mod module;
pub mod network;
pub mod operand;
pub mod part;
pub mod range;
pub mod token;

pub use arena::{Arena, ArenaId};
pub use component::{Component, Connector, Placeable, GRID};
pub use design::{Design, Pull};
pub use error::OperandError;
pub use ids::{ComponentId, NetworkId, OperandId, PartId};
pub use module::{Instance, Scope};
pub use network::{Conn, ConnIter, Endpoint, NetKind, Network, Networks};
pub use operand::{DriveLogic, GateFunc, Operand, OperandKind, Writer};
pub use part::{PartSpec, PinBinding, RailKind};
pub use range::BitRange;
pub use token::{lex_words, Token, TokenKind, TokenStream};
