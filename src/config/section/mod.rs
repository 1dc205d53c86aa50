//! Configuration section definitions.
//!
//! Each module corresponds to a section in `assetwarp.toml`:
//!
//! | Module    | TOML Section       | Purpose                             |
//! |-----------|--------------------|-------------------------------------|
//! | `serve`   | `[serve]`          | Server address, static root, pool   |
//! | `fetch`   | `[fetch]`          | Outbound timeout, size, same-origin |
//! | `engine`  | `[engine]`         | Image engine selection              |
//! | `source`  | `[[source]]`       | Asset categories and their targets  |
//! | `profile` | `[profile.<name>]` | Transformation profiles             |

mod engine;
mod fetch;
mod profile;
mod serve;
mod source;

pub use engine::{EngineConfig, EngineKind};
pub use fetch::FetchConfig;
pub use profile::ProfileConfig;
pub use serve::ServeConfig;
pub use source::SourceConfig;
