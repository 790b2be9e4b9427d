//! 容器错误类型定义

use thiserror::Error;

/// 容器操作结果类型
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 容器错误
///
/// 容器内部不会吞掉任何错误：每个失败都会中止当前操作并向调用方传播
#[derive(Error, Debug)]
pub enum ContainerError {
    /// 按名称查找 Bean 定义失败
    #[error("No bean named '{0}' is defined")]
    NoSuchBeanDefinition(String),

    /// Bean 实例化失败（构造器匹配失败、构造器执行失败等）
    #[error("Failed to instantiate bean of type '{type_name}': {reason}")]
    BeanInstantiation { type_name: String, reason: String },

    /// Bean 属性填充失败（setter 调用失败、引用解析失败等）
    #[error("Error populating bean '{bean_name}': {reason}")]
    BeanPopulation { bean_name: String, reason: String },

    /// Bean 定义重名（加载器层面的策略，注册表本身允许覆盖）
    #[error("A bean definition named '{0}' already exists; bean names must be unique")]
    DuplicateBeanDefinition(String),

    /// 上下文重复刷新
    #[error("Application context has already been refreshed; refresh must only be called once")]
    ContextAlreadyRefreshed,

    /// 日志系统初始化失败
    #[error("Logging initialization failed: {0}")]
    LoggingInitFailed(String),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContainerError::NoSuchBeanDefinition("userService".to_string());
        assert_eq!(err.to_string(), "No bean named 'userService' is defined");

        let err = ContainerError::BeanInstantiation {
            type_name: "TestBean".to_string(),
            reason: "no suitable constructor found".to_string(),
        };
        assert!(err.to_string().contains("TestBean"));
        assert!(err.to_string().contains("no suitable constructor found"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: ContainerError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ContainerError::Other(_)));
    }
}
