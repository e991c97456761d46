//! 默认值

/// 托管引擎虚拟机名称
pub const HOSTED_ENGINE_VM_NAME: &str = "HostedEngine";
