//! 应用上下文
//!
//! 在工厂之上提供刷新编排：工厂级后置处理 → 实例级处理器注册 →
//! 单例预实例化。刷新是一次性的，重复调用直接报错。

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::RwLock;

use crate::bean::{BeanDefinition, BeanInstance, BoxedBean};
use crate::bean_factory::{
    BeanDefinitionRegistry, BeanFactory, ConfigurableBeanFactory,
    ConfigurableListableBeanFactory, DefaultListableBeanFactory, ListableBeanFactory,
};
use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::{BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor};
use crate::post_processor::{ContextPostProcessor, PostProcessorRegistrationDelegate};

/// 应用上下文
///
/// 持有底层工厂，并把 [`BeanFactory`] / [`ListableBeanFactory`]
/// 操作委托给它
pub struct ApplicationContext {
    bean_factory: Arc<DefaultListableBeanFactory>,
    /// 手工注册的工厂级处理器，注册顺序
    post_processors: RwLock<Vec<ContextPostProcessor>>,
    refreshed: AtomicBool,
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationContext {
    pub fn new() -> Self {
        Self {
            bean_factory: Arc::new(DefaultListableBeanFactory::new()),
            post_processors: RwLock::new(Vec::new()),
            refreshed: AtomicBool::new(false),
        }
    }

    pub fn bean_factory(&self) -> &Arc<DefaultListableBeanFactory> {
        &self.bean_factory
    }

    /// 刷新前手工注册一个普通工厂后置处理器
    pub fn add_bean_factory_post_processor(
        &self,
        processor: Arc<dyn BeanFactoryPostProcessor>,
    ) {
        self.post_processors
            .write()
            .push(ContextPostProcessor::Factory(processor));
    }

    /// 刷新前手工注册一个注册表后置处理器
    pub fn add_bean_definition_registry_post_processor(
        &self,
        processor: Arc<dyn BeanDefinitionRegistryPostProcessor>,
    ) {
        self.post_processors
            .write()
            .push(ContextPostProcessor::Registry(processor));
    }

    /// 刷新上下文（一次性）
    ///
    /// 依次执行：工厂级后置处理（六步次序）、实例级处理器的发现与注册、
    /// 全部定义的预实例化。任何一步失败都会中止刷新并传播错误
    pub fn refresh(&self) -> ContainerResult<()> {
        if self.refreshed.swap(true, Ordering::SeqCst) {
            return Err(ContainerError::ContextAlreadyRefreshed);
        }
        tracing::info!("Refreshing application context");

        let processors = self.post_processors.read().clone();
        PostProcessorRegistrationDelegate::invoke_bean_factory_post_processors(
            &self.bean_factory,
            &processors,
        )?;

        self.register_bean_post_processors()?;
        self.bean_factory.preinstantiate_singletons()?;

        tracing::info!(
            "Application context refreshed with {} bean definition(s)",
            self.bean_factory.bean_definition_count()
        );
        Ok(())
    }

    /// 发现并注册所有声明了实例级处理能力的定义
    ///
    /// 处理器自身也是 Bean，在这里被提前实例化；此时它们还不在
    /// 工厂的处理器列表里，所以不会处理到自己
    fn register_bean_post_processors(&self) -> ContainerResult<()> {
        for name in self.bean_factory.bean_post_processor_names() {
            let definition = self.bean_factory.get_bean_definition(&name)?;
            let bean = self.bean_factory.get_bean(&name)?;
            let processor = definition
                .bean_class()
                .cast_bean_post_processor(bean)
                .ok_or_else(|| {
                    ContainerError::Other(anyhow!(
                        "bean '{}' declares the bean post processor capability but cannot be cast to one",
                        name
                    ))
                })?;
            self.bean_factory.add_bean_post_processor(processor);
        }
        Ok(())
    }
}

impl BeanFactory for ApplicationContext {
    fn get_bean(&self, bean_name: &str) -> ContainerResult<BeanInstance> {
        self.bean_factory.get_bean(bean_name)
    }

    fn get_bean_with_args(
        &self,
        bean_name: &str,
        args: Vec<BoxedBean>,
    ) -> ContainerResult<BeanInstance> {
        self.bean_factory.get_bean_with_args(bean_name, args)
    }

    fn contains_bean(&self, bean_name: &str) -> bool {
        self.bean_factory.contains_bean(bean_name)
    }
}

impl ListableBeanFactory for ApplicationContext {
    fn bean_definition_names(&self) -> Vec<String> {
        self.bean_factory.bean_definition_names()
    }

    fn bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.bean_factory.bean_names_for_type(type_id)
    }

    fn get_beans_for_type(
        &self,
        type_id: TypeId,
    ) -> ContainerResult<HashMap<String, BeanInstance>> {
        self.bean_factory.get_beans_for_type(type_id)
    }
}

impl BeanDefinitionRegistry for ApplicationContext {
    fn register_bean_definition(&self, bean_name: &str, definition: BeanDefinition) {
        self.bean_factory
            .register_bean_definition(bean_name, definition);
    }

    fn get_bean_definition(&self, bean_name: &str) -> ContainerResult<BeanDefinition> {
        self.bean_factory.get_bean_definition(bean_name)
    }

    fn contains_bean_definition(&self, bean_name: &str) -> bool {
        self.bean_factory.contains_bean_definition(bean_name)
    }

    fn bean_definition_count(&self) -> usize {
        self.bean_factory.bean_definition_count()
    }
}
