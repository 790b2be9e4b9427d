//! 工厂级后置处理器的编排
//!
//! 刷新时的调用次序是硬契约：
//! 1. 手工注册的注册表后置处理器，注册顺序；
//! 2. 以定义形式存在的注册表后置处理器：先解析名称，再逐个实例化并调用，
//!    发现顺序，名字记入已处理集合；
//! 3. 重复扫描，直到没有新的注册表后置处理器定义（处理器可以注册处理器）；
//! 4. 上述全部注册表后置处理器的工厂角色回调，按最初调用顺序；
//! 5. 手工注册的普通工厂后置处理器，注册顺序；
//! 6. 以定义形式存在、且尚未处理过的工厂后置处理器，发现顺序。

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;

use crate::bean_factory::{BeanDefinitionRegistry, BeanFactory, DefaultListableBeanFactory};
use crate::error::{ContainerError, ContainerResult};
use crate::lifecycle::{BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor};

/// 手工注册的工厂级处理器
///
/// 两类处理器放在同一个按注册顺序排列的列表里，变体区分角色
#[derive(Clone)]
pub enum ContextPostProcessor {
    Registry(Arc<dyn BeanDefinitionRegistryPostProcessor>),
    Factory(Arc<dyn BeanFactoryPostProcessor>),
}

/// 刷新编排的静态入口
pub struct PostProcessorRegistrationDelegate;

impl PostProcessorRegistrationDelegate {
    /// 按六步次序调用所有工厂级后置处理器
    pub fn invoke_bean_factory_post_processors(
        bean_factory: &DefaultListableBeanFactory,
        context_processors: &[ContextPostProcessor],
    ) -> ContainerResult<()> {
        let mut processed: HashSet<String> = HashSet::new();
        let mut registry_processors: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>> = Vec::new();

        // 第 1 步：手工注册的注册表后置处理器
        for processor in context_processors {
            if let ContextPostProcessor::Registry(processor) = processor {
                processor.post_process_bean_definition_registry(bean_factory)?;
                registry_processors.push(Arc::clone(processor));
            }
        }

        // 第 2、3 步：定义形式的注册表后置处理器，迭代到收敛
        loop {
            let candidates: Vec<String> = bean_factory
                .registry_post_processor_names()
                .into_iter()
                .filter(|name| !processed.contains(name))
                .collect();
            if candidates.is_empty() {
                break;
            }

            let mut current: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>> = Vec::new();
            for name in &candidates {
                tracing::debug!("Resolving registry post processor bean '{}'", name);
                current.push(Self::registry_post_processor_bean(bean_factory, name)?);
                processed.insert(name.clone());
            }
            for processor in &current {
                processor.post_process_bean_definition_registry(bean_factory)?;
            }
            registry_processors.extend(current);
        }

        // 第 4 步：注册表后置处理器的工厂角色，按最初的调用顺序
        for processor in &registry_processors {
            processor.post_process_bean_factory(bean_factory)?;
        }

        // 第 5 步：手工注册的普通工厂后置处理器
        for processor in context_processors {
            if let ContextPostProcessor::Factory(processor) = processor {
                processor.post_process_bean_factory(bean_factory)?;
            }
        }

        // 第 6 步：定义形式、尚未处理过的工厂后置处理器
        let factory_candidates: Vec<String> = bean_factory
            .factory_post_processor_names()
            .into_iter()
            .filter(|name| !processed.contains(name))
            .collect();
        for name in factory_candidates {
            tracing::debug!("Resolving factory post processor bean '{}'", name);
            let processor = Self::factory_post_processor_bean(bean_factory, &name)?;
            processor.post_process_bean_factory(bean_factory)?;
        }

        Ok(())
    }

    fn registry_post_processor_bean(
        bean_factory: &DefaultListableBeanFactory,
        bean_name: &str,
    ) -> ContainerResult<Arc<dyn BeanDefinitionRegistryPostProcessor>> {
        let definition = bean_factory.get_bean_definition(bean_name)?;
        let bean = bean_factory.get_bean(bean_name)?;
        definition
            .bean_class()
            .cast_registry_post_processor(bean)
            .ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "bean '{}' declares the registry post processor capability but cannot be cast to one",
                    bean_name
                ))
            })
    }

    fn factory_post_processor_bean(
        bean_factory: &DefaultListableBeanFactory,
        bean_name: &str,
    ) -> ContainerResult<Arc<dyn BeanFactoryPostProcessor>> {
        let definition = bean_factory.get_bean_definition(bean_name)?;
        let bean = bean_factory.get_bean(bean_name)?;
        definition
            .bean_class()
            .cast_factory_post_processor(bean)
            .ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "bean '{}' declares the factory post processor capability but cannot be cast to one",
                    bean_name
                ))
            })
    }
}
