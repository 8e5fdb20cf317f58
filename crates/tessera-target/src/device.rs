//! Device-capability queries used to fill in target attributes.
//!
//! A target config carrying `from_device=<id>` asks the runtime for the
//! properties of that device. The runtime is reached through [`DeviceApi`],
//! selected by device type via [`DeviceQuery`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, TargetError};
use crate::kind::TargetKind;
use crate::value::{ConfigMap, Value};

/// Numeric device type code as understood by runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceType(pub i32);

impl DeviceType {
    pub const CPU: DeviceType = DeviceType(1);
    pub const CUDA: DeviceType = DeviceType(2);
    pub const OPENCL: DeviceType = DeviceType(4);
    pub const VULKAN: DeviceType = DeviceType(7);
    pub const ROCM: DeviceType = DeviceType(10);
    pub const EXT_DEV: DeviceType = DeviceType(12);
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            DeviceType::CPU => "cpu",
            DeviceType::CUDA => "cuda",
            DeviceType::OPENCL => "opencl",
            DeviceType::VULKAN => "vulkan",
            DeviceType::ROCM => "rocm",
            DeviceType::EXT_DEV => "ext_dev",
            DeviceType(other) => return write!(f, "device_type({other})"),
        };
        write!(f, "{name}")
    }
}

/// A concrete device: type plus ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Device {
    pub device_type: DeviceType,
    pub device_id: i64,
}

/// A runtime able to answer property queries for its devices.
pub trait DeviceApi {
    /// Whether the device exists on this machine.
    fn exists(&self, device: Device) -> bool;

    /// The value of a target property, or [`Value::None`] if unknown.
    fn target_property(&self, device: Device, key: &str) -> Value;
}

/// Finds the runtime for a device type.
pub trait DeviceQuery {
    fn device_api(&self, device_type: DeviceType) -> Option<&dyn DeviceApi>;
}

/// Device runtimes keyed by device type.
#[derive(Default, Clone)]
pub struct DeviceRegistry {
    apis: BTreeMap<DeviceType, Arc<dyn DeviceApi + Send + Sync>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, device_type: DeviceType, api: Arc<dyn DeviceApi + Send + Sync>) {
        self.apis.insert(device_type, api);
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("device_types", &self.apis.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DeviceQuery for DeviceRegistry {
    fn device_api(&self, device_type: DeviceType) -> Option<&dyn DeviceApi> {
        self.apis
            .get(&device_type)
            .map(|api| api.as_ref() as &dyn DeviceApi)
    }
}

/// Read every schema-declared attribute of `kind` from the device.
///
/// Properties the runtime does not know are left out. Without runtime
/// support, or when the device does not exist and `strict` is off, the
/// result is empty and the target keeps its defaults.
pub fn query_device(
    devices: Option<&dyn DeviceQuery>,
    kind: &TargetKind,
    device_type: DeviceType,
    device_id: i64,
    strict: bool,
) -> Result<ConfigMap> {
    let mut output = ConfigMap::new();
    let device = Device {
        device_type,
        device_id,
    };

    let Some(api) = devices.and_then(|d| d.device_api(device_type)) else {
        info!(
            kind = kind.name(),
            device_id,
            %device_type,
            "device runtime unavailable, using default target parameters"
        );
        return Ok(output);
    };

    if !api.exists(device) {
        let message = format!(
            "Requested reading the parameters for {} from device_id {device_id}, but device_id {device_id} doesn't exist",
            kind.name()
        );
        if strict {
            return Err(TargetError::value(message));
        }
        warn!("{message}. Using default target parameters.");
        return Ok(output);
    }

    debug!(kind = kind.name(), device_id, "querying device properties");
    for key in kind.attrs().keys() {
        let value = api.target_property(device, key);
        if !value.is_none() {
            output.insert(key.clone(), value);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    struct FakeGpu;

    impl DeviceApi for FakeGpu {
        fn exists(&self, device: Device) -> bool {
            device.device_id == 0
        }

        fn target_property(&self, _device: Device, key: &str) -> Value {
            match key {
                "max_num_threads" => Value::Int(1024),
                _ => Value::None,
            }
        }
    }

    fn gpu_kind() -> TargetKind {
        TargetKind::builder("gpu", DeviceType::CUDA)
            .add_attr_option("max_num_threads", ValueType::Int)
            .build()
            .unwrap()
    }

    fn query(device_id: i64, strict: bool) -> Result<ConfigMap> {
        let mut registry = DeviceRegistry::new();
        registry.register(DeviceType::CUDA, Arc::new(FakeGpu));
        let devices: &dyn DeviceQuery = &registry;
        query_device(Some(devices), &gpu_kind(), DeviceType::CUDA, device_id, strict)
    }

    #[test]
    fn queries_declared_keys() {
        let params = query(0, false).unwrap();
        assert_eq!(params.get("max_num_threads"), Some(&Value::Int(1024)));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn missing_runtime_is_empty() {
        let params = query_device(None, &gpu_kind(), DeviceType::CUDA, 0, true).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn missing_device_is_lenient_by_default() {
        assert!(query(3, false).unwrap().is_empty());
    }

    #[test]
    fn missing_device_fails_when_strict() {
        let err = query(3, true).unwrap_err();
        assert!(err.message().contains("doesn't exist"));
    }

    #[test]
    fn device_type_names() {
        assert_eq!(DeviceType::CUDA.to_string(), "cuda");
        assert_eq!(DeviceType(99).to_string(), "device_type(99)");
    }
}
