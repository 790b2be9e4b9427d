//! 容器扩展点契约
//!
//! 三类后置处理器，对应三个介入时机：
//! - [`BeanDefinitionRegistryPostProcessor`]：定义加载后、任何实例创建前，可增删改定义
//! - [`BeanFactoryPostProcessor`]：定义集合定稿后、实例化前，可读取并修改定义
//! - [`BeanPostProcessor`]：每个实例创建流程中，初始化前后各有一个钩子

use crate::bean::BeanInstance;
use crate::bean_factory::{BeanDefinitionRegistry, ConfigurableListableBeanFactory};
use crate::error::ContainerResult;

/// Bean 实例级扩展钩子
///
/// 两个钩子都返回处理后的实例，可以是原实例，也可以是替换后的包装实例
pub trait BeanPostProcessor: Send + Sync {
    /// 初始化回调之前调用
    fn post_process_before_initialization(
        &self,
        bean: BeanInstance,
        _bean_name: &str,
    ) -> ContainerResult<BeanInstance> {
        Ok(bean)
    }

    /// 初始化回调之后调用
    ///
    /// 典型用途：创建代理、包装实例
    fn post_process_after_initialization(
        &self,
        bean: BeanInstance,
        _bean_name: &str,
    ) -> ContainerResult<BeanInstance> {
        Ok(bean)
    }

    /// 处理器名称（用于日志）
    fn name(&self) -> &str {
        "BeanPostProcessor"
    }

    /// 处理器优先级，数字越小越先执行
    ///
    /// 默认 1000；同优先级保持注册顺序（稳定排序）
    fn order(&self) -> i32 {
        1000
    }
}

/// 工厂级扩展钩子
///
/// 在所有定义加载完成之后、任何 Bean 实例化之前调用一次，
/// 可以读取并修改已注册的定义
pub trait BeanFactoryPostProcessor: Send + Sync {
    fn post_process_bean_factory(
        &self,
        bean_factory: &dyn ConfigurableListableBeanFactory,
    ) -> ContainerResult<()>;
}

/// 注册表级扩展钩子
///
/// 在工厂级回调之前运行，可以向注册表追加新定义（包括新的处理器定义）。
/// 同时继承工厂级契约：注册表角色先于所有工厂角色执行
pub trait BeanDefinitionRegistryPostProcessor: BeanFactoryPostProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()>;
}
