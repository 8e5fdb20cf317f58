//! Built-in target kinds.
//!
//! Provides the `llvm`, `c`, `cuda`, `rocm` and `opencl` kinds. Hosts that
//! need other kinds register them on the returned registry.

use std::collections::BTreeMap;

use crate::device::DeviceType;
use crate::error::{Result, TargetError};
use crate::kind::{KindRegistry, TargetKind};
use crate::value::{ConfigMap, Value, ValueType};

/// A registry holding every built-in kind.
pub fn builtin_kinds() -> Result<KindRegistry> {
    let mut registry = KindRegistry::new();
    registry.register(llvm()?)?;
    registry.register(c()?)?;
    registry.register(cuda()?)?;
    registry.register(rocm()?)?;
    registry.register(opencl()?)?;
    Ok(registry)
}

fn str_array() -> ValueType {
    ValueType::array_of(ValueType::Str)
}

fn llvm() -> Result<TargetKind> {
    TargetKind::builder("llvm", DeviceType::CPU)
        .add_attr_option("mattr", str_array())
        .add_attr_option("mcpu", ValueType::Str)
        .add_attr_option("mtriple", ValueType::Str)
        .add_attr_option("mfloat-abi", ValueType::Str)
        .add_attr_option("mabi", ValueType::Str)
        .add_attr_option("num-cores", ValueType::Int)
        .add_attr_option("opt-level", ValueType::Int)
        .add_attr_option("fast-math", ValueType::Bool)
        .add_attr_option("cl-opt", str_array())
        .add_attr_option("jit", ValueType::Str)
        .add_attr_option("vector-width", ValueType::Int)
        .set_default_keys(["cpu"])
        .set_target_parser(llvm_target_parser)
        .build()
}

/// Derive architecture features from `mtriple` and `mattr`.
fn llvm_target_parser(mut config: ConfigMap) -> Result<ConfigMap> {
    let arch = config
        .get("mtriple")
        .and_then(Value::as_str)
        .and_then(|triple| triple.split('-').next())
        .unwrap_or_default()
        .to_string();
    let mattr: Vec<String> = match config.get("mattr") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::Str(s)) => s.split(',').map(|a| a.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    let is_x86 = matches!(arch.as_str(), "x86_64" | "i386" | "i686");
    let is_aarch64 = matches!(arch.as_str(), "aarch64" | "arm64");
    let has_sve = is_aarch64 && mattr.iter().any(|a| a == "+sve" || a == "+sve2");

    let mut features = BTreeMap::new();
    features.insert(Value::from("arch"), Value::Str(arch));
    features.insert(Value::from("is_x86"), Value::Bool(is_x86));
    features.insert(Value::from("is_aarch64"), Value::Bool(is_aarch64));
    features.insert(Value::from("has_sve"), Value::Bool(has_sve));
    config.insert("features".into(), Value::Map(features));
    Ok(config)
}

fn c() -> Result<TargetKind> {
    TargetKind::builder("c", DeviceType::CPU)
        .add_attr_option("mcpu", ValueType::Str)
        .add_attr_option("march", ValueType::Str)
        .add_attr_option("workspace-byte-alignment", ValueType::Int)
        .add_attr_option("constants-byte-alignment", ValueType::Int)
        .set_default_keys(["cpu"])
        .build()
}

fn cuda() -> Result<TargetKind> {
    TargetKind::builder("cuda", DeviceType::CUDA)
        .add_attr_option("mcpu", ValueType::Str)
        .add_attr_option("arch", ValueType::Str)
        .add_attr_option("max_shared_memory_per_block", ValueType::Int)
        .add_attr_option("max_threads_per_block", ValueType::Int)
        .add_attr_option_with_default("max_num_threads", ValueType::Int, 1024i64)
        .add_attr_option_with_default("thread_warp_size", ValueType::Int, 32i64)
        .add_attr_option("registers_per_block", ValueType::Int)
        .add_attr_option("l2_cache_size_bytes", ValueType::Int)
        .set_default_keys(["cuda", "gpu"])
        .set_attrs_preprocessor(cuda_preprocessor)
        .build()
}

/// Normalize `arch` to the `sm_XX` form, falling back to `mcpu` and then
/// `sm_50`. Applying it twice gives the same result.
fn cuda_preprocessor(mut attrs: ConfigMap) -> Result<ConfigMap> {
    let arch = attrs
        .get("arch")
        .or_else(|| attrs.get("mcpu"))
        .and_then(Value::as_str)
        .unwrap_or("sm_50")
        .to_string();
    let arch = if !arch.is_empty() && arch.chars().all(|c| c.is_ascii_digit()) {
        format!("sm_{arch}")
    } else {
        arch
    };
    if !arch.starts_with("sm_") {
        return Err(TargetError::value(format!(
            "CUDA arch must be of the form sm_XX, but get: {arch}"
        )));
    }
    attrs.insert("arch".into(), Value::Str(arch));
    Ok(attrs)
}

fn rocm() -> Result<TargetKind> {
    TargetKind::builder("rocm", DeviceType::ROCM)
        .add_attr_option_with_default("mcpu", ValueType::Str, "gfx900")
        .add_attr_option_with_default("mtriple", ValueType::Str, "amdgcn-amd-amdhsa-hcc")
        .add_attr_option("mattr", str_array())
        .add_attr_option_with_default("max_num_threads", ValueType::Int, 256i64)
        .add_attr_option_with_default("thread_warp_size", ValueType::Int, 64i64)
        .add_attr_option_with_default("max_shared_memory_per_block", ValueType::Int, 65536i64)
        .set_default_keys(["rocm", "gpu"])
        .build()
}

fn opencl() -> Result<TargetKind> {
    TargetKind::builder("opencl", DeviceType::OPENCL)
        .add_attr_option_with_default("max_threads_per_block", ValueType::Int, 256i64)
        .add_attr_option_with_default("max_num_threads", ValueType::Int, 256i64)
        .add_attr_option_with_default("thread_warp_size", ValueType::Int, 1i64)
        .add_attr_option_with_default("texture_spatial_limit", ValueType::Int, 16384i64)
        .set_default_keys(["opencl", "gpu"])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::kind::{KindExtension, KindLookup};
    use crate::resolver::Resolver;
    use crate::target::Target;

    #[test]
    fn registers_every_kind() {
        let kinds = builtin_kinds().unwrap();
        assert_eq!(kinds.names(), vec!["c", "cuda", "llvm", "opencl", "rocm"]);
        let llvm = kinds.lookup_kind("llvm").unwrap();
        assert!(matches!(llvm.extension(), KindExtension::Parser(_)));
        let cuda = kinds.lookup_kind("cuda").unwrap();
        assert!(matches!(cuda.extension(), KindExtension::Preprocessor(_)));
        assert_eq!(cuda.default_device_type(), DeviceType::CUDA);
    }

    #[test]
    fn llvm_features_follow_the_triple() {
        let kinds = builtin_kinds().unwrap();
        let resolver = Resolver::new(&kinds);
        let t = Target::parse(
            "llvm -mtriple=aarch64-linux-gnu -mattr=+neon,+sve",
            &resolver,
        )
        .unwrap();
        assert_eq!(t.get_feature("arch"), Some(&Value::from("aarch64")));
        assert_eq!(t.get_feature("is_aarch64"), Some(&Value::Bool(true)));
        assert_eq!(t.get_feature("has_sve"), Some(&Value::Bool(true)));
        assert_eq!(t.get_feature("is_x86"), Some(&Value::Bool(false)));
        assert!(t.get_attr("features").is_none());
    }

    #[test]
    fn llvm_parser_reads_unparsed_configs() {
        let mut config = ConfigMap::new();
        config.insert("kind".into(), Value::from("llvm"));
        config.insert("mtriple".into(), Value::from("x86_64-pc-linux-gnu"));
        config.insert("mattr".into(), Value::from("+avx2, +fma"));
        let out = llvm_target_parser(config).unwrap();
        let features = out.get("features").and_then(Value::as_map).unwrap();
        assert_eq!(features.get(&Value::from("is_x86")), Some(&Value::Bool(true)));
        assert_eq!(out.get("kind"), Some(&Value::from("llvm")));
    }

    #[test]
    fn cuda_arch_is_normalized() {
        let kinds = builtin_kinds().unwrap();
        let resolver = Resolver::new(&kinds);
        let cases = [
            ("cuda", "sm_50"),
            ("cuda -arch=80", "sm_80"),
            ("cuda -mcpu=sm_75", "sm_75"),
            ("cuda -arch=sm_86 -mcpu=sm_75", "sm_86"),
        ];
        for (text, arch) in cases {
            let t = Target::parse(text, &resolver).unwrap();
            assert_eq!(t.get_attr("arch"), Some(&Value::from(arch)), "{text}");
        }
    }

    #[test]
    fn cuda_preprocessor_is_idempotent() {
        let mut attrs = ConfigMap::new();
        attrs.insert("arch".into(), Value::from("70"));
        let once = cuda_preprocessor(attrs).unwrap();
        let twice = cuda_preprocessor(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn cuda_rejects_foreign_arch() {
        let err = cuda_preprocessor(
            [("arch".to_string(), Value::from("gfx900"))].into_iter().collect(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn gpu_defaults_are_installed() {
        let kinds = builtin_kinds().unwrap();
        let resolver = Resolver::new(&kinds);
        let rocm = Target::parse("rocm", &resolver).unwrap();
        assert_eq!(rocm.get_attr("mcpu"), Some(&Value::from("gfx900")));
        assert_eq!(rocm.get_attr("thread_warp_size"), Some(&Value::Int(64)));
        assert_eq!(rocm.keys(), ["rocm", "gpu"]);

        let opencl = Target::parse("opencl -max_num_threads=128", &resolver).unwrap();
        assert_eq!(opencl.get_attr("max_num_threads"), Some(&Value::Int(128)));
        assert_eq!(opencl.get_attr("texture_spatial_limit"), Some(&Value::Int(16384)));
    }
}
