// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # surmise
//!
//! Builds a surmise relation over a finite set of knowledge items by asking an
//! expert questions of the form "a learner fails every item of `A`; will they
//! certainly also fail `q`?". Accepted answers become clauses of a surmise
//! function, closed under four inference rules, from which the feasible
//! knowledge states follow.
//!
//! ## Architecture
//!
//! - **Data model** (`item`, `surmise`, `query`): item ids, clauses, the
//!   surmise function and immutable query keys with a separate answer
//! - **Inference** (`infer`): the hanging-safe test and closure of the
//!   accepted query sets under IR1–IR4, evaluated per round with `rayon`
//! - **Learning space** (`space`): two-stage acceptance with a pending table
//! - **Questioning** (`generate`, `manager`, `session`, `oracle`): candidate
//!   generation by antecedent size, the query lifecycle and the ask loop
//! - **Results** (`states`, `lattice`, `export`): feasible states, their
//!   covering graph and JSON/DOT output
//! - **Edges** (`dataset`, `answer_log`, `config`): item files, the persisted
//!   answer log and TOML session configuration
//!
//! ## Library usage
//!
//! ```
//! use surmise::item::{ItemId, item_set};
//! use surmise::query::{Answer, Query, QueryKey};
//! use surmise::space::LearningSpace;
//! use surmise::states::SearchStrategy;
//!
//! let mut space = LearningSpace::new(item_set(["a", "b"]));
//! let key = QueryKey::new(item_set(["a"]), ItemId::new("b"));
//! space.apply_query(&Query::answered(key, Answer::Yes));
//!
//! let states = space.knowledge_states(SearchStrategy::Breadth);
//! assert_eq!(states.len(), 3); // {}, {a}, {a, b}
//! ```

pub mod answer_log;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod generate;
pub mod infer;
pub mod item;
pub mod lattice;
pub mod manager;
pub mod oracle;
pub mod query;
pub mod session;
pub mod space;
pub mod states;
pub mod surmise;
