//! 单例缓存
//!
//! 名称到已创建实例的映射。缓存未命中是正常信号（交给创建流程处理），
//! 不是错误；缓存不做淘汰，也不负责销毁。

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::bean::BeanInstance;

/// 单例注册表契约
pub trait SingletonBeanRegistry: Send + Sync {
    /// 登记一个单例，同名覆盖
    fn register_singleton(&self, bean_name: &str, singleton: BeanInstance);

    /// 按名称查找单例，未命中返回 `None`
    fn get_singleton(&self, bean_name: &str) -> Option<BeanInstance>;

    /// 名称是否已有单例
    fn contains_singleton(&self, bean_name: &str) -> bool;
}

/// 基于 `RwLock<HashMap>` 的默认单例注册表
#[derive(Default)]
pub struct DefaultSingletonBeanRegistry {
    singleton_objects: RwLock<HashMap<String, BeanInstance>>,
}

impl DefaultSingletonBeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton_count(&self) -> usize {
        self.singleton_objects.read().len()
    }
}

impl SingletonBeanRegistry for DefaultSingletonBeanRegistry {
    fn register_singleton(&self, bean_name: &str, singleton: BeanInstance) {
        tracing::debug!("Registering singleton bean '{}'", bean_name);
        self.singleton_objects
            .write()
            .insert(bean_name.to_string(), singleton);
    }

    fn get_singleton(&self, bean_name: &str) -> Option<BeanInstance> {
        self.singleton_objects.read().get(bean_name).cloned()
    }

    fn contains_singleton(&self, bean_name: &str) -> bool {
        self.singleton_objects.read().contains_key(bean_name)
    }
}
