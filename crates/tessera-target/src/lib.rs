//! Target descriptors for the Tessera compiler.
//!
//! A [`Target`] describes a compilation target: its kind, dispatch keys,
//! typed attributes, parser-derived features, and an optional host target.
//! Targets are built from tag names, raw strings such as
//! `llvm -mcpu=skylake -libs=cblas`, structured configs, or `{`-prefixed
//! JSON strings, and are normalized against the schema of their
//! [`TargetKind`].
//!
//! ## Modules
//!
//! - [`codec`]: quoting and escaping of target string tokens
//! - [`tokenize`]: quote-aware splitting and `-key=value` parsing
//! - [`value`]: dynamic attribute values and their declared types
//! - [`kind`]: kind schemas and the kind registry
//! - [`coerce`]: conversion of strings and values to declared types
//! - [`target`]: the target descriptor itself
//! - [`stringify`]: canonical string form
//! - [`context`]: the thread-local current-target stack
//! - [`device`]: device-capability queries
//! - [`tag`]: named, prebuilt targets and `*.tags.toml` files
//! - [`loader`]: structured `{...}` target strings
//! - [`builtin`]: the built-in kinds

pub mod builtin;
pub mod codec;
pub mod coerce;
mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod kind;
pub mod loader;
pub mod resolver;
pub mod stringify;
pub mod tag;
pub mod target;
pub mod tokenize;
pub mod value;

pub use builtin::builtin_kinds;
pub use context::{current, enter, enter_scope, exit_scope, with_target, TargetScope};
pub use device::{Device, DeviceApi, DeviceQuery, DeviceRegistry, DeviceType};
pub use error::{ErrorKind, Result, TargetError};
pub use kind::{KindLookup, KindRegistry, TargetKind, TargetKindBuilder};
pub use loader::{ConfigLoader, JsonConfigLoader};
pub use resolver::Resolver;
pub use tag::{discover_tag_files, TagLookup, TagRegistry};
pub use target::{check_and_update_host_consistency, Target};
pub use value::{ConfigMap, Value, ValueType};
