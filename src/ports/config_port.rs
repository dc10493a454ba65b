//! Configuration access port trait.
//!
//! Lookups are by INI section and key and return the raw value. Typed parsing
//! and defaults live with the caller, so a malformed value is reported rather
//! than silently replaced.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
