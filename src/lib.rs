//! # sovran-lexicon
//!
//! A generic key-value container with a thread-safe variant and typed adapters.
//!
//! `sovran-lexicon` wraps a hash map in a large, uniform vocabulary of
//! operations: single and bulk insertion, deletion, lookup and popping, plus
//! iteration with early exit, filtering, mapping, merging, intersection,
//! equality and moving contents between instances.
//!
//! ## Key Features
//!
//! - **One vocabulary, three flavors**: [`Lexicon`] for single-owner use,
//!   [`SyncLexicon`] for shared use across threads, [`TypedLexicon`] for
//!   homogeneous values kept in type-erased storage
//! - **Thread-safe**: `SyncLexicon` guards its pairs with a single
//!   `Arc<Mutex<_>>`; every operation is atomic with respect to the others
//! - **Deadlock-free binary operations**: `merge`, `equal`, `empty_into` and
//!   friends lock both instances in a stable order
//! - **Chainable**: mutators on `Lexicon` return `&mut Self`
//! - **Heterogeneous values**: [`AnyLexicon`] stores values of any type and
//!   checks the type when a value is read back
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_lexicon::Lexicon;
//!
//! let mut fruit = Lexicon::new();
//! fruit.add("apple", 3).add("banana", 5).add("cherry", 7);
//!
//! assert_eq!(fruit.get("banana"), Some(&5));
//! assert!(fruit.has_all(["apple", "cherry"]));
//!
//! // Deleting a missing key is not an error
//! fruit.delete("durian").delete("apple");
//! assert_eq!(fruit.len(), 2);
//!
//! let expensive = fruit.filter(|_, price| *price > 5);
//! assert_eq!(expensive.keys(), vec!["cherry"]);
//! ```
//!
//! ### Sharing a Lexicon Between Threads
//!
//! ```rust
//! use sovran_lexicon::{SyncLexicon, MapError};
//! use std::thread;
//!
//! fn main() -> Result<(), MapError> {
//!     let sessions = SyncLexicon::<u32, String>::new();
//!
//!     let handles: Vec<_> = (0..4u32)
//!         .map(|worker| {
//!             let sessions = sessions.clone();
//!             thread::spawn(move || sessions.add(worker, format!("worker-{}", worker)))
//!         })
//!         .collect();
//!
//!     for handle in handles {
//!         handle.join().expect("worker panicked")?;
//!     }
//!
//!     assert_eq!(sessions.len()?, 4);
//!     assert_eq!(sessions.fetch(&2)?, "worker-2");
//!     Ok(())
//! }
//! ```
//!
//! ### Moving Contents Between Instances
//!
//! ```rust
//! use sovran_lexicon::{SyncLexicon, MapError};
//!
//! fn main() -> Result<(), MapError> {
//!     let pending: SyncLexicon<&str, i64> = [("a", 1), ("b", 2)].into_iter().collect();
//!     let done = SyncLexicon::new();
//!     done.add("z", 26)?;
//!
//!     pending.empty_into(&done)?;
//!
//!     assert!(pending.is_empty()?);
//!     assert_eq!(done.len()?, 3);
//!     Ok(())
//! }
//! ```
//!
//! ### Typed Adapters
//!
//! ```rust
//! use sovran_lexicon::{AnyLexicon, Inter, Stringer, MapError};
//!
//! fn main() -> Result<(), MapError> {
//!     let counters = Inter::<&str>::new();
//!     counters.add("visits", 1)?;
//!     counters.with_mut("visits", |visits| *visits += 1)?;
//!     assert_eq!(counters.fetch("visits")?, 2);
//!
//!     // A typed view over heterogeneous storage
//!     let store = AnyLexicon::<&str>::new();
//!     store.set("greeting", "hello".to_string())?;
//!     store.set("answer", 42i64)?;
//!
//!     let strings: Stringer<&str> = store.typed();
//!     assert_eq!(strings.fetch("greeting")?, "hello");
//!     // Not a String: the adapter reads the default instead
//!     assert_eq!(strings.fetch("answer")?, "");
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_lexicon::{AnyLexicon, MapError};
//!
//! let store = AnyLexicon::<String>::new();
//!
//! if let Err(e) = store.set("config".to_string(), vec!["setting1", "setting2"]) {
//!     eprintln!("Failed to store config: {}", e);
//!     return;
//! }
//!
//! match store.get_as::<String, _>("config") {
//!     Ok(value) => println!("Config: {}", value),
//!     Err(MapError::KeyNotFound(_)) => println!("Config key not found"),
//!     Err(MapError::TypeMismatch) => println!("Config is not a String"),
//! }
//! ```

mod any_lexicon;
mod any_value;
mod error;
mod guarded;
mod lexicon;
mod typed;

pub use any_lexicon::AnyLexicon;
pub use any_value::AnyValue;
pub use error::MapError;
pub use guarded::SyncLexicon;
pub use lexicon::Lexicon;
pub use typed::{Booler, Byter, Inter, Stringer, TypedLexicon, TypedValue};
