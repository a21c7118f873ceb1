//! Analysis configuration.
//!
//! Each analysis option affects exactly one pass:
//!
//! | option                               | affected pass                    |
//! |--------------------------------------|----------------------------------|
//! | `retain_public`                      | accessibility cascade            |
//! | `retain_objc_accessible`             | index ingest retention (and the  |
//! |                                      | unused parameter marker, which   |
//! |                                      | consults the same exposure)      |
//! | `retain_assign_only_properties`      | assign-only property marker      |
//! | `retain_unused_protocol_func_params` | unused parameter marker          |
//! | `external_encodable_protocols`       | synthesized member retainer      |
//! | `ignore_comment_commands`            | comment command retainer         |

mod loader;

pub use loader::{Config, ReportConfig};
