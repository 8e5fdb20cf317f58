//! The collaborators a target is resolved against.

use std::fmt;

use crate::device::DeviceQuery;
use crate::kind::KindLookup;
use crate::loader::ConfigLoader;
use crate::tag::TagLookup;

/// Lookups injected into every target constructor.
///
/// Only the kind lookup is mandatory. Without a tag lookup no string is
/// treated as a tag; without a config loader `{`-prefixed strings fail;
/// without device runtimes `from_device` falls back to defaults.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    kinds: &'a dyn KindLookup,
    tags: Option<&'a dyn TagLookup>,
    devices: Option<&'a dyn DeviceQuery>,
    config_loader: Option<&'a dyn ConfigLoader>,
    strict_device_check: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(kinds: &'a dyn KindLookup) -> Self {
        Resolver {
            kinds,
            tags: None,
            devices: None,
            config_loader: None,
            strict_device_check: false,
        }
    }

    pub fn with_tags(mut self, tags: &'a dyn TagLookup) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_devices(mut self, devices: &'a dyn DeviceQuery) -> Self {
        self.devices = Some(devices);
        self
    }

    pub fn with_config_loader(mut self, loader: &'a dyn ConfigLoader) -> Self {
        self.config_loader = Some(loader);
        self
    }

    /// Fail instead of falling back to defaults when `from_device` names a
    /// device that does not exist.
    pub fn strict_device_check(mut self, strict: bool) -> Self {
        self.strict_device_check = strict;
        self
    }

    pub fn kinds(&self) -> &'a dyn KindLookup {
        self.kinds
    }

    pub fn tags(&self) -> Option<&'a dyn TagLookup> {
        self.tags
    }

    pub fn devices(&self) -> Option<&'a dyn DeviceQuery> {
        self.devices
    }

    pub fn config_loader(&self) -> Option<&'a dyn ConfigLoader> {
        self.config_loader
    }

    pub fn is_strict_device_check(&self) -> bool {
        self.strict_device_check
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("tags", &self.tags.is_some())
            .field("devices", &self.devices.is_some())
            .field("config_loader", &self.config_loader.is_some())
            .field("strict_device_check", &self.strict_device_check)
            .finish()
    }
}
