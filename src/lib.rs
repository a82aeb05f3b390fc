//! # fol
//! First order logic inference in the style of the textbook agents: a [kb::KnowledgeBase] is told
//! sentences, converts them to clauses and answers queries through a pluggable
//! [inference::InferenceProcedure]. Available procedures are forward and backward chaining over
//! definite clauses ([fc_ask], [bc_ask]), plain saturation by resolution ([tfm_resolution]), an
//! OTTER like given clause loop with paramodulation and demodulation ([otter]) and model
//! elimination ([model_elimination]). Every answer comes with a [proofs::Proof] of how it was
//! derived. Additionally [tptp_parser] is able to read TPTP FOF problems into sentences.

pub mod bc_ask;
pub mod chain;
pub mod clause;
pub mod clause_queue;
pub mod cnf;
pub mod domain;
pub mod error;
pub mod fc_ask;
pub mod identity;
pub mod inference;
pub mod kb;
pub mod matching;
pub mod model_elimination;
pub mod modulation;
pub mod otter;
pub mod position;
pub mod pretty_print;
pub mod proofs;
pub mod sentence;
pub mod standardize;
pub mod subst;
pub mod subsume;
pub mod term;
pub mod tfm_resolution;
pub mod tptp_parser;
pub mod trivial;
pub mod unify;
