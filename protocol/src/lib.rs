// Copyright (c) 2026 Solis Foundation. MIT License.
// See LICENSE for details.

//! # Solis Protocol — Transaction Core
//!
//! The consensus-critical transaction subsystem of a Solis delegated
//! proof-of-stake node: building, canonicalizing, signing, verifying, and
//! applying transactions against account state.
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 and SHA-256 wrappers. The only primitives the
//!   consensus path touches.
//! - **config** — Chain constants and the runtime [`config::ChainParams`].
//! - **slots** — Epoch time, slot, and round arithmetic.
//! - **account** — The [`account::Account`] view, additive
//!   [`account::AccountDelta`] merges, and the [`account::AccountStore`]
//!   contract the core mutates state through.
//! - **storage** — The [`storage::KeyValueLedger`] contract, its sled-backed
//!   [`storage::SolisDb`] implementation, and the minimal block reference.
//! - **transaction** — Everything consensus-critical: codec, signatures,
//!   the verification pipeline, state mutation with compensating rollback,
//!   persistence mapping, and the type-handler plug-in seam.
//!
//! ## Design stance
//!
//! 1. One canonical byte encoding, allocated once at exact length. Any
//!    deviation is a fork, so the codec is boring on purpose.
//! 2. No hidden globals: chain parameters and the handler registry travel
//!    in an immutable [`transaction::ChainContext`] built at startup.
//! 3. Balances move only through additive deltas with exact inverses, which
//!    is what makes compensating rollback provably restore state.
//! 4. If it touches money, it has tests. Plural.

pub mod account;
pub mod config;
pub mod crypto;
pub mod slots;
pub mod storage;
pub mod transaction;
