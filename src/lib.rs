//! Course TA - retrieval-augmented answers for course questions
//!
//! Answers student questions from a precomputed snapshot of course pages and
//! forum posts, returning a generated answer together with the links it drew on.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `corpus` - The read-only fragment store loaded from a snapshot
//! - `embedding` - Query embedding
//! - `tokenizer` - Token counting for the context budget
//! - `completion` - Chat completion and image captioning
//! - `rag` - Ranking, reply expansion, budgeting, citations and answer assembly
//! - `cli` - Command-line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use course_ta::config::Settings;
//! use course_ta::rag::{AnswerEngine, Query};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let engine = AnswerEngine::from_settings(&settings)?;
//!
//!     let answer = engine.answer(&Query::new("When is GA1 due?")).await?;
//!     println!("{}", answer.answer);
//!     for link in &answer.links {
//!         println!("{} - {}", link.label, link.url);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod rag;
pub mod tokenizer;

pub use error::{QaError, Result};
